//! Postgres implementation of the EmailMessageRepository trait

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query_as, FromRow};
use uuid::Uuid;

use crate::{
    domain::communication::email_messages::{
        errors::EmailMessageError, EmailMessage, EmailMessageRepository, NewEmailMessage,
    },
    infrastructure::db::postgres::PostgresDatabase,
};

#[derive(FromRow)]
struct EmailMessageRecord {
    id: Uuid,
    sender: String,
    recipients: String,
    subject: String,
    body: String,
    html_body: Option<String>,
    sent_at: DateTime<Utc>,
    status: String,
    error_message: Option<String>,
    provider_message_id: Option<String>,
    transport: String,
    requested_by: String,
}

impl TryFrom<EmailMessageRecord> for EmailMessage {
    type Error = EmailMessageError;

    fn try_from(record: EmailMessageRecord) -> Result<Self, Self::Error> {
        Ok(EmailMessage {
            id: record.id,
            sender: record.sender,
            recipients: record.recipients,
            subject: record.subject,
            body: record.body,
            html_body: record.html_body,
            sent_at: record.sent_at,
            status: record.status.parse()?,
            error_message: record.error_message,
            provider_message_id: record.provider_message_id,
            transport: record.transport,
            requested_by: record.requested_by,
        })
    }
}

fn unknown(err: sqlx::Error) -> EmailMessageError {
    EmailMessageError::UnknownError(anyhow!("Unknown database error: {:?}", err))
}

#[async_trait]
impl EmailMessageRepository for PostgresDatabase {
    #[mutants::skip]
    async fn record_email(&self, email: &NewEmailMessage) -> Result<Uuid, EmailMessageError> {
        let (id,): (Uuid,) = query_as(
            r#"
            INSERT INTO email_messages (
                id, sender, recipients, subject, body, html_body,
                status, error_message, provider_message_id, transport, requested_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(email.id)
        .bind(&email.sender)
        .bind(&email.recipients)
        .bind(&email.subject)
        .bind(&email.body)
        .bind(&email.html_body)
        .bind(email.status.as_str())
        .bind(&email.error_message)
        .bind(&email.provider_message_id)
        .bind(&email.transport)
        .bind(&email.requested_by)
        .fetch_one(&self.pool)
        .await
        .map_err(unknown)?;

        Ok(id)
    }

    #[mutants::skip]
    async fn recent_emails(
        &self,
        requested_by: &str,
        limit: i64,
    ) -> Result<Vec<EmailMessage>, EmailMessageError> {
        query_as::<_, EmailMessageRecord>(
            r#"
            SELECT
                id,
                sender,
                recipients,
                subject,
                body,
                html_body,
                sent_at,
                status,
                error_message,
                provider_message_id,
                transport,
                requested_by
            FROM email_messages
            WHERE requested_by = $1
            ORDER BY sent_at DESC
            LIMIT $2
            "#,
        )
        .bind(requested_by)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unknown)?
        .into_iter()
        .map(EmailMessage::try_from)
        .collect()
    }
}

