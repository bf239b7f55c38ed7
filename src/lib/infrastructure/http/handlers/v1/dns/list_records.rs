//! List DNS records handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{
        communication::email_messages::EmailService,
        dns::{DnsRecord, DnsService},
    },
    infrastructure::http::{errors::ApiError, state::AppState},
};

/// A stored record as listed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DnsRecordListItem {
    /// The stored record, with its full value
    #[serde(flatten)]
    pub record: DnsRecord,

    /// The value shortened for display
    #[schema(example = "v=DKIM1; k=rsa; p=MIGfMA0GCSq...")]
    pub display_value: String,
}

/// DNS records response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListRecordsResponse {
    /// The mail domain
    #[schema(example = "example.com")]
    pub domain: String,

    /// Newest first
    pub records: Vec<DnsRecordListItem>,
}

/// List planned records for the mail domain
#[utoipa::path(
    get,
    operation_id = "list_dns_records",
    tag = "DNS",
    path = "/api/v1/dns/records",
    responses(
        (status = StatusCode::OK, description = "Planned records", body = ListRecordsResponse),
    )
)]
pub async fn handler<E: EmailService, D: DnsService>(
    State(state): State<AppState<E, D>>,
) -> Result<Json<ListRecordsResponse>, ApiError> {
    let records = state.dns.list_records().await?;

    Ok(Json(ListRecordsResponse {
        domain: state.dns.domain(),
        records: records
            .into_iter()
            .map(|record| DnsRecordListItem {
                display_value: record.display_value(),
                record,
            })
            .collect(),
    }))
}
