//! Transport selection

use std::sync::Arc;

use super::{Mailer, Message, Outcome};

/// One of the two configured delivery mechanisms
#[derive(Debug)]
pub enum Transport<'a, S: Mailer, A: Mailer> {
    /// Authenticated SMTP relay
    Smtp(&'a S),

    /// The provider's send API
    Api(&'a A),
}

impl<S: Mailer, A: Mailer> Transport<'_, S, A> {
    /// Dispatch through whichever transport was selected
    pub async fn dispatch(&self, message: &Message) -> Outcome {
        match self {
            Self::Smtp(smtp) => smtp.dispatch(message).await,
            Self::Api(api) => api.dispatch(message).await,
        }
    }

    /// A short name for logs and records
    pub fn name(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Api(_) => "api",
        }
    }
}

/// Holds both transports and hands out the one the caller asks for
#[derive(Debug)]
pub struct TransportSelector<S: Mailer, A: Mailer> {
    smtp: Arc<S>,
    api: Arc<A>,
}

impl<S: Mailer, A: Mailer> Clone for TransportSelector<S, A> {
    fn clone(&self) -> Self {
        Self {
            smtp: Arc::clone(&self.smtp),
            api: Arc::clone(&self.api),
        }
    }
}

impl<S: Mailer, A: Mailer> TransportSelector<S, A> {
    /// Create a selector over an SMTP and an API transport
    pub fn new(smtp: Arc<S>, api: Arc<A>) -> Self {
        Self { smtp, api }
    }

    /// Pick a transport. Pure: nothing is contacted until `dispatch`.
    pub fn select(&self, use_direct_api: bool) -> Transport<'_, S, A> {
        if use_direct_api {
            Transport::Api(self.api.as_ref())
        } else {
            Transport::Smtp(self.smtp.as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::communication::mailer::tests::MockMailer;

    use super::*;

    fn message() -> Message {
        Message::build("a@x.com", "b@x.com", "Hi", "Hello", None).expect("valid message")
    }

    #[test]
    fn test_select_is_pure() {
        let mut smtp = MockMailer::new();
        let mut api = MockMailer::new();

        smtp.expect_dispatch().times(0);
        api.expect_dispatch().times(0);

        let selector = TransportSelector::new(Arc::new(smtp), Arc::new(api));

        assert_eq!(selector.select(false).name(), "smtp");
        assert_eq!(selector.select(true).name(), "api");
    }

    #[tokio::test]
    async fn test_smtp_selected_by_default() -> TestResult {
        let mut smtp = MockMailer::new();
        let mut api = MockMailer::new();

        smtp.expect_dispatch()
            .times(1)
            .returning(|_| Outcome::sent(None));
        api.expect_dispatch().times(0);

        let selector = TransportSelector::new(Arc::new(smtp), Arc::new(api));

        let outcome = selector.select(false).dispatch(&message()).await;

        assert_eq!(outcome, Outcome::sent(None));

        Ok(())
    }

    #[tokio::test]
    async fn test_direct_api_selected() -> TestResult {
        let mut smtp = MockMailer::new();
        let mut api = MockMailer::new();

        smtp.expect_dispatch().times(0);
        api.expect_dispatch()
            .times(1)
            .returning(|_| Outcome::sent(Some("message-id".to_string())));

        let selector = TransportSelector::new(Arc::new(smtp), Arc::new(api));

        let outcome = selector.select(true).dispatch(&message()).await;

        assert_eq!(outcome.provider_message_id(), Some("message-id"));

        Ok(())
    }
}
