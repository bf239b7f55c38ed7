//! Cloud email provider transport

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use clap::Parser;
use tracing::{debug, info, warn};

use crate::domain::communication::mailer::{ConfigurationError, Mailer, Message, Outcome};

mod client;
mod credentials;

pub use client::{
    sign, EmailClient, EmailContent, EmailRecipient, ErrorDetail, OperationState,
    OperationStatus, PreparedRequest, ProviderError, Recipients, RestEmailClient, SendRequest,
    SignedHeaders,
};
pub use credentials::{ProviderCredentials, ResolvedCredentials};

/// Email provider configuration
///
/// Either a connection string, or an endpoint and API key. Not both.
#[derive(Clone, Default, Parser)]
pub struct ProviderConfig {
    /// `endpoint=https://...;accesskey=...`
    #[clap(
        long = "email-provider-connection-string",
        env = "EMAIL_PROVIDER_CONNECTION_STRING"
    )]
    pub connection_string: Option<String>,

    /// The provider resource endpoint
    #[clap(long = "email-provider-endpoint", env = "EMAIL_PROVIDER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// The base64 access key for the endpoint
    #[clap(long = "email-provider-api-key", env = "EMAIL_PROVIDER_API_KEY")]
    pub api_key: Option<String>,

    /// Delay between status polls, in milliseconds
    #[clap(
        long = "email-provider-poll-interval-ms",
        env = "EMAIL_PROVIDER_POLL_INTERVAL_MS",
        default_value = "1000"
    )]
    pub poll_interval_ms: u64,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "********");

        f.debug_struct("ProviderConfig")
            .field("connection_string", &redacted(&self.connection_string))
            .field("endpoint", &self.endpoint)
            .field("api_key", &redacted(&self.api_key))
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

impl From<&Message> for SendRequest {
    fn from(message: &Message) -> Self {
        Self {
            sender_address: message.sender().to_string(),
            recipients: Recipients {
                to: message
                    .recipients()
                    .iter()
                    .map(|address| EmailRecipient {
                        address: address.clone(),
                    })
                    .collect(),
            },
            content: EmailContent {
                subject: message.subject().to_string(),
                plain_text: message.body().to_string(),
                html: message.html_body().map(String::from),
            },
        }
    }
}

/// Sends through the provider's API and waits for the operation to finish
pub struct ApiMailer<C: EmailClient = RestEmailClient> {
    client: Arc<C>,
    poll_interval: Duration,
}

impl<C: EmailClient> Clone for ApiMailer<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            poll_interval: self.poll_interval,
        }
    }
}

impl<C: EmailClient> fmt::Debug for ApiMailer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiMailer")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ApiMailer {
    /// Create a mailer from configuration.
    ///
    /// # Errors
    /// Fails when neither or both credential modes are configured, or the
    /// credentials cannot be parsed. Nothing is sent in that case.
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigurationError> {
        let credentials = ProviderCredentials::from_config(config)?.resolve()?;

        debug!("email provider endpoint {}", credentials.endpoint);

        Ok(Self::with_client(
            RestEmailClient::new(reqwest::Client::new(), credentials),
            Duration::from_millis(config.poll_interval_ms),
        ))
    }
}

impl<C: EmailClient> ApiMailer<C> {
    /// Create a mailer with a custom client
    pub fn with_client(client: C, poll_interval: Duration) -> Self {
        Self {
            client: Arc::new(client),
            poll_interval,
        }
    }

    async fn wait_for(&self, operation_id: &str) -> Result<OperationState, ProviderError> {
        loop {
            let state = self.client.poll(operation_id).await?;

            if state.status.is_terminal() {
                return Ok(state);
            }

            debug!("operation {operation_id} is {:?}", state.status);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn failure_reason(state: &OperationState) -> String {
    state
        .error
        .as_ref()
        .and_then(|error| error.message.clone().or_else(|| error.code.clone()))
        .unwrap_or_else(|| format!("operation {} ended as {:?}", state.id, state.status))
}

#[async_trait]
impl<C: EmailClient> Mailer for ApiMailer<C> {
    async fn dispatch(&self, message: &Message) -> Outcome {
        let request = SendRequest::from(message);

        let operation_id = match self.client.begin_send(&request).await {
            Ok(id) => id,
            Err(e) => {
                warn!("email provider rejected send: {e}");
                return Outcome::failed(e.to_string());
            }
        };

        match self.wait_for(&operation_id).await {
            Ok(state) if state.status == OperationStatus::Succeeded => {
                info!("email provider accepted message {}", state.id);
                Outcome::sent(Some(state.id))
            }
            Ok(state) => {
                let reason = failure_reason(&state);
                warn!("email provider operation {operation_id} failed: {reason}");
                Outcome::failed(reason)
            }
            Err(e) => {
                warn!("polling email provider operation {operation_id} failed: {e}");
                Outcome::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    pub use super::client::MockEmailClient;
}
