//! DNS verification handler

use axum::{extract::State, Json};

use crate::{
    domain::{
        communication::email_messages::EmailService,
        dns::{DnsService, VerificationReport},
    },
    infrastructure::http::{errors::ApiError, state::AppState},
};

/// Check the mail domain's live MX and SPF records.
///
/// A query that fails is reported in `results` and clears `all_ok`; it is not
/// an HTTP error. When `all_ok` is set every stored record is marked verified.
#[utoipa::path(
    post,
    operation_id = "verify_dns",
    tag = "DNS",
    path = "/api/v1/dns/verify",
    responses(
        (status = StatusCode::OK, description = "Verification report", body = VerificationReport),
    )
)]
pub async fn handler<E: EmailService, D: DnsService>(
    State(state): State<AppState<E, D>>,
) -> Result<Json<VerificationReport>, ApiError> {
    Ok(Json(state.dns.verify().await?))
}
