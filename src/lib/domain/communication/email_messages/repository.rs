//! Email message repository module

use async_trait::async_trait;
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use super::{errors::EmailMessageError, EmailMessage, NewEmailMessage};

/// Append-only store of send attempts
#[async_trait]
pub trait EmailMessageRepository: Clone + Send + Sync + 'static {
    /// Record one send attempt
    async fn record_email(&self, email: &NewEmailMessage) -> Result<Uuid, EmailMessageError>;

    /// The requester's most recent attempts, newest first
    async fn recent_emails(
        &self,
        requested_by: &str,
        limit: i64,
    ) -> Result<Vec<EmailMessage>, EmailMessageError>;
}

#[cfg(test)]
mock! {
    pub EmailMessageRepository {}

    impl Clone for EmailMessageRepository {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl EmailMessageRepository for EmailMessageRepository {
        async fn record_email(&self, email: &NewEmailMessage) -> Result<Uuid, EmailMessageError>;
        async fn recent_emails(&self, requested_by: &str, limit: i64) -> Result<Vec<EmailMessage>, EmailMessageError>;
    }
}
