//! Create MX record handler

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

fn default_priority() -> u16 {
    10
}

/// Create MX record request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMxBody {
    /// The exchange host
    #[schema(example = "mx.example.com")]
    mail_server: String,

    /// Preference, lower is tried first
    #[schema(example = 10, default = 10)]
    #[serde(default = "default_priority")]
    priority: u16,
}

/// Plan an MX record for the mail domain
#[utoipa::path(
    post,
    operation_id = "create_mx_record",
    tag = "DNS",
    path = "/api/v1/dns/mx",
    request_body = CreateMxBody,
    responses(
        (status = StatusCode::CREATED, description = "Record planned", body = PlannedRecordResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Missing mail server or bad priority", body = ErrorResponse),
    )
)]
pub async fn handler<E: EmailService, D: DnsService>(
    State(state): State<AppState<E, D>>,
    request: Result<Json<CreateMxBody>, JsonRejection>,
) -> Result<(StatusCode, Json<PlannedRecordResponse>), ApiError> {
    let Json(request) = request?;

    let planned = state
        .dns
        .plan_mx(&request.mail_server, request.priority)
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

    #[tokio::test]
    async fn test_create_mx_default_priority() -> TestResult {
        let mut dns = MockDnsService::new();

        dns.expect_plan_mx()
            .times(1)
            .withf(|mail_server, priority| mail_server == "mx.example.com" && *priority == 10)
            .returning(|mail_server, priority| {
                Ok(planned(
                    DnsRecordKind::Mx,
                    "example.com",
                    &format!("{priority} {mail_server}"),
                    "Created MX record for example.com pointing to mx.example.com with priority 10",
                ))
            });

        let response = TestServer::new(router(test_state(None, Some(dns))))?
            .post("/api/v1/dns/mx")
            .json(&serde_json::json!({ "mail_server": "mx.example.com" }))
            .await;

        response.assert_status(StatusCode::CREATED);

        let json = response.json::<PlannedRecordResponse>();

        assert_eq!(json.kind, DnsRecordKind::Mx);
        assert_eq!(json.value, "10 mx.example.com");
        assert_eq!(
            json.message,
            "Created MX record for example.com pointing to mx.example.com with priority 10"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_create_mx_priority_out_of_range() -> TestResult {
        let mut dns = MockDnsService::new();

        dns.expect_plan_mx().times(0);

        let response = TestServer::new(router(test_state(None, Some(dns))))?
            .post("/api/v1/dns/mx")
            .json(&serde_json::json!({ "mail_server": "mx.example.com", "priority": 70000 }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_mx_missing_server() -> TestResult {
        let mut dns = MockDnsService::new();

        dns.expect_plan_mx()
            .returning(|_, _| Err(DnsRecordError::EmptyMailServer));

        let response = TestServer::new(router(test_state(None, Some(dns))))?
            .post("/api/v1/dns/mx")
            .json(&serde_json::json!({ "mail_server": "", "priority": 5 }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.json::<ErrorResponse>().error,
            "a mail server is required"
        );

        Ok(())
    }
}
