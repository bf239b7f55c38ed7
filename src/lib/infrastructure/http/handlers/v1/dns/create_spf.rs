//! Create SPF record handler

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{communication::email_messages::EmailService, dns::DnsService},
    infrastructure::http::{errors::ApiError, state::AppState},
};

use super::PlannedRecordResponse;

/// Allowed senders, as a list or a single space-separated string
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowedServers {
    /// `["include:spf.example.net", "ip4:192.0.2.1"]`
    List(Vec<String>),

    /// `"include:spf.example.net ip4:192.0.2.1"`
    Text(String),
}

impl AllowedServers {
    fn into_list(self) -> Vec<String> {
        match self {
            Self::List(servers) => servers,
            Self::Text(text) => text.split_whitespace().map(String::from).collect(),
        }
    }
}

/// Create SPF record request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSpfBody {
    /// Mechanisms allowed to send for the domain, as a list or one space-separated string
    #[schema(value_type = Vec<String>, example = json!(["include:spf.example.net", "ip4:192.0.2.1"]))]
    allowed_servers: AllowedServers,
}

/// Plan an SPF record for the mail domain
#[utoipa::path(
    post,
    operation_id = "create_spf_record",
    tag = "DNS",
    path = "/api/v1/dns/spf",
    request_body = CreateSpfBody,
    responses(
        (status = StatusCode::CREATED, description = "Record planned", body = PlannedRecordResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "No allowed servers", body = ErrorResponse),
    )
)]
pub async fn handler<E: EmailService, D: DnsService>(
    State(state): State<AppState<E, D>>,
    request: Result<Json<CreateSpfBody>, JsonRejection>,
) -> Result<(StatusCode, Json<PlannedRecordResponse>), ApiError> {
    let Json(request) = request?;

    let planned = state
        .dns
        .plan_spf(&request.allowed_servers.into_list())
        .await?;

    Ok((StatusCode::CREATED, Json(planned.into())))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use testresult::TestResult;

    use crate::{
        domain::dns::{errors::DnsRecordError, tests::MockDnsService, DnsRecordKind},
        infrastructure::http::{
            errors::ErrorResponse,
            handlers::v1::dns::{fixtures::planned, PlannedRecordResponse},
            servers::https::router,
            state::test_state,
        },
    };

    fn dns_expecting(servers: &'static [&'static str]) -> MockDnsService {
        let mut dns = MockDnsService::new();

        dns.expect_plan_spf()
            .times(1)
            .withf(move |allowed| allowed == servers)
            .returning(|allowed| {
                let value = format!("v=spf1 {} -all", allowed.join(" "));
                Ok(planned(
                    DnsRecordKind::Spf,
                    "example.com",
                    &value,
                    &format!("Created SPF record for example.com: {value}"),
                ))
            });

        dns
    }

    #[tokio::test]
    async fn test_create_spf_from_list() -> TestResult {
        let dns = dns_expecting(&["include:spf.example.net", "ip4:192.0.2.1"]);

        let response = TestServer::new(router(test_state(None, Some(dns))))?
            .post("/api/v1/dns/spf")
            .json(&serde_json::json!({
                "allowed_servers": ["include:spf.example.net", "ip4:192.0.2.1"]
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(
            response.json::<PlannedRecordResponse>().value,
            "v=spf1 include:spf.example.net ip4:192.0.2.1 -all"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_spf_from_text() -> TestResult {
        let dns = dns_expecting(&["a.com", "b.com"]);

        let response = TestServer::new(router(test_state(None, Some(dns))))?
            .post("/api/v1/dns/spf")
            .json(&serde_json::json!({ "allowed_servers": "  a.com   b.com " }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(
            response.json::<PlannedRecordResponse>().message,
            "Created SPF record for example.com: v=spf1 a.com b.com -all"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_spf_empty() -> TestResult {
        let mut dns = MockDnsService::new();

        dns.expect_plan_spf()
            .returning(|_| Err(DnsRecordError::EmptyServerList));

        let response = TestServer::new(router(test_state(None, Some(dns))))?
            .post("/api/v1/dns/spf")
            .json(&serde_json::json!({ "allowed_servers": [] }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.json::<ErrorResponse>().error,
            "at least one allowed server is required"
        );

        Ok(())
    }
}
