//! Send email handler

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        communication::{
            email_messages::{EmailService, EmailStatus, SendEmailRequest},
            mailer::Outcome,
        },
        dns::DnsService,
    },
    infrastructure::http::{errors::ApiError, state::AppState},
};

use super::requested_by;

/// Send email request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SendEmailBody {
    /// Sender address
    #[schema(example = "noreply@example.com")]
    sender: String,

    /// Comma-separated recipient addresses
    #[schema(example = "a@example.com, b@example.com")]
    recipients: String,

    /// Subject line
    #[schema(example = "Welcome")]
    subject: String,

    /// Plain-text body
    #[schema(example = "Hello!")]
    body: String,

    /// Optional HTML alternative
    #[schema(example = "<p>Hello!</p>")]
    #[serde(default)]
    html_body: Option<String>,

    /// Send through the provider API instead of the SMTP relay
    #[serde(default)]
    use_direct_api: bool,
}

impl From<SendEmailBody> for SendEmailRequest {
    fn from(body: SendEmailBody) -> Self {
        Self {
            sender: body.sender,
            recipients: body.recipients,
            subject: body.subject,
            body: body.body,
            html_body: body.html_body,
            use_direct_api: body.use_direct_api,
        }
    }
}

/// Send email response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendEmailResponse {
    /// The id of the stored record
    id: Uuid,

    /// Always `SENT`; failures are returned as errors
    status: EmailStatus,

    /// The provider's id for the message, API transport only
    #[schema(example = "0a8c5a2e-1b7e-4d55-9d1f-4e0c6f5ab2f1")]
    provider_message_id: Option<String>,
}

/// Send an email
#[utoipa::path(
    post,
    operation_id = "send_email",
    tag = "Emails",
    path = "/api/v1/emails",
    request_body = SendEmailBody,
    params(
        ("x-requested-by" = Option<String>, Header, description = "Caller identity, defaults to anonymous"),
    ),
    responses(
        (status = StatusCode::CREATED, description = "Email sent", body = SendEmailResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid sender or recipients", body = ErrorResponse),
        (status = StatusCode::BAD_GATEWAY, description = "The transport failed, the attempt is still recorded", body = ErrorResponse, example = json!({"error": "auth_failed"})),
    )
)]
pub async fn handler<E: EmailService, D: DnsService>(
    State(state): State<AppState<E, D>>,
    headers: HeaderMap,
    request: Result<Json<SendEmailBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SendEmailResponse>), ApiError> {
    let Json(request) = request?;

    let sent = state
        .emails
        .send_email(&request.into(), &requested_by(&headers))
        .await?;

    match sent.outcome {
        Outcome::Sent {
            provider_message_id,
        } => Ok((
            StatusCode::CREATED,
            Json(SendEmailResponse {
                id: sent.id,
                status: EmailStatus::Sent,
                provider_message_id,
            }),
        )),
        Outcome::Failed { reason } => Err(ApiError::new_502(&reason)),
    }
}
