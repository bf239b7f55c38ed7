//! Email service

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::{
    email_addresses::EmailAddress,
    mailer::{Mailer, Message, Outcome, TransportSelector},
};

use super::{
    errors::{EmailMessageError, SendEmailError},
    EmailMessage, EmailMessageRepository, NewEmailMessage,
};

/// Raw form input for a send
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailRequest {
    /// Sender address
    pub sender: String,

    /// Comma-separated recipient addresses
    pub recipients: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub body: String,

    /// Optional HTML body
    pub html_body: Option<String>,

    /// Use the provider API instead of the SMTP relay
    pub use_direct_api: bool,
}

/// The result of a recorded send attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentEmail {
    /// The id of the stored record
    pub id: Uuid,

    /// What the transport reported
    pub outcome: Outcome,
}

/// Email service
#[async_trait]
pub trait EmailService: Clone + Send + Sync + 'static {
    /// Validates, dispatches and records an email.
    ///
    /// # Arguments
    /// * `request` - The raw [`SendEmailRequest`].
    /// * `requested_by` - The identity of the caller, stored with the record.
    ///
    /// # Returns
    /// - [`Ok`] with a [`SentEmail`] once the attempt is recorded, whether or not the
    ///   transport delivered it; check [`SentEmail::outcome`].
    /// - [`Err`] with a [`SendEmailError`] if the input is invalid (nothing is sent) or
    ///   the attempt could not be recorded.
    async fn send_email(
        &self,
        request: &SendEmailRequest,
        requested_by: &str,
    ) -> Result<SentEmail, SendEmailError>;

    /// The requester's most recent send attempts, newest first.
    async fn recent_emails(
        &self,
        requested_by: &str,
        limit: i64,
    ) -> Result<Vec<EmailMessage>, EmailMessageError>;
}

#[cfg(test)]
mock! {
    pub EmailService {}

    impl Clone for EmailService {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl EmailService for EmailService {
        async fn send_email(&self, request: &SendEmailRequest, requested_by: &str) -> Result<SentEmail, SendEmailError>;
        async fn recent_emails(&self, requested_by: &str, limit: i64) -> Result<Vec<EmailMessage>, EmailMessageError>;
    }
}

/// Email service implementation
#[derive(Debug)]
pub struct EmailServiceImpl<R, S, A>
where
    R: EmailMessageRepository,
    S: Mailer,
    A: Mailer,
{
    repo: Arc<R>,
    transports: TransportSelector<S, A>,
}

impl<R, S, A> Clone for EmailServiceImpl<R, S, A>
where
    R: EmailMessageRepository,
    S: Mailer,
    A: Mailer,
{
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            transports: self.transports.clone(),
        }
    }
}

impl<R, S, A> EmailServiceImpl<R, S, A>
where
    R: EmailMessageRepository,
    S: Mailer,
    A: Mailer,
{
    /// Create a new email service
    pub fn new(repo: Arc<R>, transports: TransportSelector<S, A>) -> Self {
        Self { repo, transports }
    }

    fn build_message(request: &SendEmailRequest) -> Result<Message, SendEmailError> {
        let sender = EmailAddress::new(&request.sender).map_err(SendEmailError::InvalidSender)?;

        let message = Message::build(
            sender.as_str(),
            &request.recipients,
            &request.subject,
            &request.body,
            request.html_body.as_deref(),
        )?;

        for recipient in message.recipients() {
            EmailAddress::new(recipient).map_err(SendEmailError::InvalidRecipient)?;
        }

        Ok(message)
    }
}

#[async_trait]
impl<R, S, A> EmailService for EmailServiceImpl<R, S, A>
where
    R: EmailMessageRepository,
    S: Mailer,
    A: Mailer,
{
    async fn send_email(
        &self,
        request: &SendEmailRequest,
        requested_by: &str,
    ) -> Result<SentEmail, SendEmailError> {
        let message = Self::build_message(request)?;

        let transport = self.transports.select(request.use_direct_api);
        let outcome = transport.dispatch(&message).await;

        match &outcome {
            Outcome::Sent { .. } => info!(
                transport = transport.name(),
                recipients = message.recipients().len(),
                "email sent"
            ),
            Outcome::Failed { reason } => warn!(
                transport = transport.name(),
                reason = %reason,
                "email failed"
            ),
        }

        let record = NewEmailMessage::new(&message, &outcome, transport.name(), requested_by);
        let id = self.repo.record_email(&record).await?;

        Ok(SentEmail { id, outcome })
    }

    async fn recent_emails(
        &self,
        requested_by: &str,
        limit: i64,
    ) -> Result<Vec<EmailMessage>, EmailMessageError> {
        self.repo.recent_emails(requested_by, limit).await
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::Utc;
    use testresult::TestResult;

    use crate::domain::communication::{
        email_messages::{tests::MockEmailMessageRepository, EmailStatus},
        mailer::tests::MockMailer,
    };

    use super::*;

    fn request(recipients: &str, use_direct_api: bool) -> SendEmailRequest {
        SendEmailRequest {
            sender: "a@x.com".to_string(),
            recipients: recipients.to_string(),
            subject: "Hi".to_string(),
            body: "Hello".to_string(),
            html_body: None,
            use_direct_api,
        }
    }

    fn service(
        repo: MockEmailMessageRepository,
        smtp: MockMailer,
        api: MockMailer,
    ) -> EmailServiceImpl<MockEmailMessageRepository, MockMailer, MockMailer> {
        EmailServiceImpl::new(
            Arc::new(repo),
            TransportSelector::new(Arc::new(smtp), Arc::new(api)),
        )
    }

    #[tokio::test]
    async fn test_send_email_over_smtp_is_recorded_as_sent() -> TestResult {
        let record_id = Uuid::now_v7();

        let mut repo = MockEmailMessageRepository::new();
        let mut smtp = MockMailer::new();
        let mut api = MockMailer::new();

        smtp.expect_dispatch()
            .times(1)
            .withf(|message| message.recipients() == ["b@x.com", "c@x.com"])
            .returning(|_| Outcome::sent(None));
        api.expect_dispatch().times(0);

        repo.expect_record_email()
            .times(1)
            .withf(|record| {
                record.status == EmailStatus::Sent
                    && record.error_message.is_none()
                    && record.sender == "a@x.com"
                    && record.recipients == "b@x.com, c@x.com"
                    && record.transport == "smtp"
                    && record.requested_by == "someone"
            })
            .returning(move |_| Ok(record_id));

        let sent = service(repo, smtp, api)
            .send_email(&request("b@x.com, c@x.com", false), "someone")
            .await?;

        assert_eq!(sent.id, record_id);
        assert_eq!(sent.outcome, Outcome::sent(None));

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_dispatch_is_recorded_with_reason() -> TestResult {
        let mut repo = MockEmailMessageRepository::new();
        let mut smtp = MockMailer::new();
        let mut api = MockMailer::new();

        smtp.expect_dispatch().times(0);
        api.expect_dispatch()
            .times(1)
            .returning(|_| Outcome::failed("provider unavailable"));

        repo.expect_record_email()
            .times(1)
            .withf(|record| {
                record.status == EmailStatus::Failed
                    && record.error_message.as_deref() == Some("provider unavailable")
                    && record.transport == "api"
            })
            .returning(|record| Ok(record.id));

        let sent = service(repo, smtp, api)
            .send_email(&request("b@x.com", true), "someone")
            .await?;

        assert!(!sent.outcome.is_sent());

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_recipients_are_rejected_before_dispatch() {
        let mut repo = MockEmailMessageRepository::new();
        let mut smtp = MockMailer::new();

        repo.expect_record_email().times(0);
        smtp.expect_dispatch().times(0);

        let result = service(repo, smtp, MockMailer::new())
            .send_email(&request(" , ", false), "someone")
            .await;

        assert!(matches!(result, Err(SendEmailError::EmptyRecipientList)));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected_before_dispatch() {
        let mut smtp = MockMailer::new();

        smtp.expect_dispatch().times(0);

        let result = service(MockEmailMessageRepository::new(), smtp, MockMailer::new())
            .send_email(&request("b@x.com, not-an-address", false), "someone")
            .await;

        assert!(matches!(result, Err(SendEmailError::InvalidRecipient(_))));
    }

    #[tokio::test]
    async fn test_invalid_sender_is_rejected_before_dispatch() {
        let mut smtp = MockMailer::new();

        smtp.expect_dispatch().times(0);

        let mut request = request("b@x.com", false);
        request.sender = "nobody".to_string();

        let result = service(MockEmailMessageRepository::new(), smtp, MockMailer::new())
            .send_email(&request, "someone")
            .await;

        assert!(matches!(result, Err(SendEmailError::InvalidSender(_))));
    }

    #[tokio::test]
    async fn test_record_failure_is_reported() {
        let mut repo = MockEmailMessageRepository::new();
        let mut smtp = MockMailer::new();

        smtp.expect_dispatch()
            .times(1)
            .returning(|_| Outcome::sent(None));
        repo.expect_record_email()
            .times(1)
            .returning(|_| Err(EmailMessageError::UnknownError(anyhow!("database is down"))));

        let result = service(repo, smtp, MockMailer::new())
            .send_email(&request("b@x.com", false), "someone")
            .await;

        assert!(matches!(result, Err(SendEmailError::NotRecorded(_))));
    }

    #[tokio::test]
    async fn test_recent_emails() -> TestResult {
        let mut repo = MockEmailMessageRepository::new();

        let stored = EmailMessage {
            id: Uuid::now_v7(),
            sender: "a@x.com".to_string(),
            recipients: "b@x.com".to_string(),
            subject: "Hi".to_string(),
            body: "Hello".to_string(),
            html_body: None,
            sent_at: Utc::now(),
            status: EmailStatus::Sent,
            error_message: None,
            provider_message_id: None,
            transport: "smtp".to_string(),
            requested_by: "someone".to_string(),
        };
        let expected = stored.clone();

        repo.expect_recent_emails()
            .times(1)
            .withf(|requested_by, limit| requested_by == "someone" && *limit == 10)
            .returning(move |_, _| Ok(vec![stored.clone()]));

        let emails = service(repo, MockMailer::new(), MockMailer::new())
            .recent_emails("someone", 10)
            .await?;

        assert_eq!(emails, vec![expected]);

        Ok(())
    }
}
