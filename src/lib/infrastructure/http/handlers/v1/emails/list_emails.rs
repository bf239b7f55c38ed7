//! Recent emails handler

use axum::{extract::State, http::HeaderMap, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        communication::email_messages::{EmailMessage, EmailService, EmailStatus},
        dns::DnsService,
    },
    infrastructure::http::{errors::ApiError, state::AppState},
};

use super::requested_by;

const RECENT_EMAILS: i64 = 10;

/// A sent email as listed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmailListItem {
    id: Uuid,

    #[schema(example = "noreply@example.com")]
    sender: String,

    /// Full recipient list
    recipients: String,

    /// The first two recipients and a count of the rest
    #[schema(example = "a@example.com, b@example.com (+3 more)")]
    recipients_summary: String,

    subject: String,

    sent_at: DateTime<Utc>,

    status: EmailStatus,

    error_message: Option<String>,

    provider_message_id: Option<String>,

    #[schema(example = "smtp")]
    transport: String,
}

impl From<EmailMessage> for EmailListItem {
    fn from(email: EmailMessage) -> Self {
        Self {
            recipients_summary: email.recipients_summary(),
            id: email.id,
            sender: email.sender,
            recipients: email.recipients,
            subject: email.subject,
            sent_at: email.sent_at,
            status: email.status,
            error_message: email.error_message,
            provider_message_id: email.provider_message_id,
            transport: email.transport,
        }
    }
}

/// Recent emails response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListEmailsResponse {
    /// Newest first
    emails: Vec<EmailListItem>,
}

/// List the caller's most recent emails
#[utoipa::path(
    get,
    operation_id = "list_emails",
    tag = "Emails",
    path = "/api/v1/emails",
    params(
        ("x-requested-by" = Option<String>, Header, description = "Caller identity, defaults to anonymous"),
    ),
    responses(
        (status = StatusCode::OK, description = "Recent emails", body = ListEmailsResponse),
    )
)]
pub async fn handler<E: EmailService, D: DnsService>(
    State(state): State<AppState<E, D>>,
    headers: HeaderMap,
) -> Result<Json<ListEmailsResponse>, ApiError> {
    let emails = state
        .emails
        .recent_emails(&requested_by(&headers), RECENT_EMAILS)
        .await?;

    Ok(Json(ListEmailsResponse {
        emails: emails.into_iter().map(EmailListItem::from).collect(),
    }))
}
