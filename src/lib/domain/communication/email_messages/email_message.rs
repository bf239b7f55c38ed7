//! Sent-email records

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::communication::mailer::{Message, Outcome};

use super::errors::EmailMessageError;

/// Whether a recorded attempt was delivered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailStatus {
    /// The transport accepted the message
    Sent,

    /// The transport reported a failure
    Failed,
}

impl EmailStatus {
    /// The stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailStatus {
    type Err = EmailMessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SENT" => Ok(Self::Sent),
            "FAILED" => Ok(Self::Failed),
            other => Err(EmailMessageError::UnknownStatus(other.to_string())),
        }
    }
}

impl From<&Outcome> for EmailStatus {
    fn from(outcome: &Outcome) -> Self {
        if outcome.is_sent() {
            Self::Sent
        } else {
            Self::Failed
        }
    }
}

/// One row per send attempt, about to be written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEmailMessage {
    /// Record id
    pub id: Uuid,

    /// Sender address
    pub sender: String,

    /// Recipients joined with `", "`
    pub recipients: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub body: String,

    /// HTML body
    pub html_body: Option<String>,

    /// Delivery status
    pub status: EmailStatus,

    /// Why delivery failed
    pub error_message: Option<String>,

    /// The provider's message id
    pub provider_message_id: Option<String>,

    /// Which transport was used
    pub transport: String,

    /// Who asked for the message to be sent
    pub requested_by: String,
}

impl NewEmailMessage {
    /// Describe a finished dispatch attempt
    pub fn new(message: &Message, outcome: &Outcome, transport: &str, requested_by: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender: message.sender().to_string(),
            recipients: message.joined_recipients(),
            subject: message.subject().to_string(),
            body: message.body().to_string(),
            html_body: message.html_body().map(String::from),
            status: outcome.into(),
            error_message: outcome.reason().map(String::from),
            provider_message_id: outcome.provider_message_id().map(String::from),
            transport: transport.to_string(),
            requested_by: requested_by.to_string(),
        }
    }
}

/// A stored send attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmailMessage {
    /// Record id
    pub id: Uuid,

    /// Sender address
    #[schema(example = "noreply@example.com")]
    pub sender: String,

    /// Recipients joined with `", "`
    #[schema(example = "b@example.com, c@example.com")]
    pub recipients: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub body: String,

    /// HTML body
    pub html_body: Option<String>,

    /// When the attempt was made
    pub sent_at: DateTime<Utc>,

    /// Delivery status
    pub status: EmailStatus,

    /// Why delivery failed
    pub error_message: Option<String>,

    /// The provider's message id
    pub provider_message_id: Option<String>,

    /// Which transport was used
    pub transport: String,

    /// Who asked for the message to be sent
    pub requested_by: String,
}

impl EmailMessage {
    /// A short form of the recipient list: the first two, then a count
    pub fn recipients_summary(&self) -> String {
        let recipients: Vec<&str> = self.recipients.split(',').map(str::trim).collect();

        if recipients.len() > 2 {
            format!(
                "{}, {} (+{} more)",
                recipients[0],
                recipients[1],
                recipients.len() - 2
            )
        } else {
            self.recipients.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn stored(recipients: &str) -> EmailMessage {
        EmailMessage {
            id: Uuid::now_v7(),
            sender: "a@x.com".to_string(),
            recipients: recipients.to_string(),
            subject: "Hi".to_string(),
            body: "Hello".to_string(),
            html_body: None,
            sent_at: Utc::now(),
            status: EmailStatus::Sent,
            error_message: None,
            provider_message_id: None,
            transport: "smtp".to_string(),
            requested_by: "someone".to_string(),
        }
    }

    #[test]
    fn test_new_email_message_from_failed_outcome() -> TestResult {
        let message = Message::build("a@x.com", "b@x.com, c@x.com", "Hi", "Hello", None)?;
        let outcome = Outcome::failed("auth_failed");

        let record = NewEmailMessage::new(&message, &outcome, "smtp", "someone");

        assert_eq!(record.status, EmailStatus::Failed);
        assert_eq!(record.error_message.as_deref(), Some("auth_failed"));
        assert_eq!(record.recipients, "b@x.com, c@x.com");
        assert_eq!(record.provider_message_id, None);

        Ok(())
    }

    #[test]
    fn test_status_round_trips_through_storage_form() -> TestResult {
        assert_eq!("SENT".parse::<EmailStatus>()?, EmailStatus::Sent);
        assert_eq!("FAILED".parse::<EmailStatus>()?, EmailStatus::Failed);
        assert!("PENDING".parse::<EmailStatus>().is_err());

        Ok(())
    }

    #[test]
    fn test_recipients_summary() {
        assert_eq!(stored("b@x.com, c@x.com").recipients_summary(), "b@x.com, c@x.com");
        assert_eq!(
            stored("b@x.com, c@x.com, d@x.com, e@x.com").recipients_summary(),
            "b@x.com, c@x.com (+2 more)"
        );
    }
}
