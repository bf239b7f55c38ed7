//! Create DKIM record handler

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

/// Create DKIM record request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDkimBody {
    /// The selector the signer uses
    #[schema(example = "selector1")]
    selector: String,

    /// The TXT payload, stored verbatim
    #[schema(example = "v=DKIM1; k=rsa; p=MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQ")]
    dkim_value: String,
}

/// Plan a DKIM key record for the mail domain
#[utoipa::path(
    post,
    operation_id = "create_dkim_record",
    tag = "DNS",
    path = "/api/v1/dns/dkim",
    request_body = CreateDkimBody,
    responses(
        (status = StatusCode::CREATED, description = "Record planned", body = PlannedRecordResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Missing selector or value", body = ErrorResponse),
    )
)]
pub async fn handler<E: EmailService, D: DnsService>(
    State(state): State<AppState<E, D>>,
    request: Result<Json<CreateDkimBody>, JsonRejection>,
) -> Result<(StatusCode, Json<PlannedRecordResponse>), ApiError> {
    let Json(request) = request?;

    let planned = state
        .dns
        .plan_dkim(&request.selector, &request.dkim_value)
        .await?;

    Ok((StatusCode::CREATED, Json(planned.into())))
}
