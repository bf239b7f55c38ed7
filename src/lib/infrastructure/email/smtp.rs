//! SMTP relay transport

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use clap::{ArgAction, Parser};
use lettre::{
    message::{MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, warn};

use crate::domain::communication::mailer::{Mailer, Message, Outcome};

mod session;

pub use session::{LettreConnector, SessionGuard, SmtpConnector, SmtpSession, SmtpSessionError};

/// SMTP configuration
#[derive(Clone, Default, Parser)]
pub struct SMTPConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST")]
    pub host: String,

    /// The SMTP port
    #[clap(long = "smtp-port", env = "SMTP_PORT", default_value = "587")]
    pub port: u16,

    /// The SMTP username
    #[clap(long = "smtp-user", env = "SMTP_USER")]
    pub username: String,

    /// The SMTP password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD")]
    pub password: String,

    /// The name sent in EHLO, defaults to the local hostname
    #[clap(long = "smtp-hello-name", env = "SMTP_HELLO_NAME")]
    pub hello_name: Option<String>,

    /// Verify the TLS certificate
    #[clap(
        long = "smtp-verify-tls",
        env = "SMTP_VERIFY_TLS",
        default_value = "true",
        action = ArgAction::Set
    )]
    pub verify_tls: bool,

    /// Connection timeout in seconds
    #[clap(long = "smtp-timeout-secs", env = "SMTP_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,
}

impl fmt::Debug for SMTPConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SMTPConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"********")
            .field("hello_name", &self.hello_name)
            .field("verify_tls", &self.verify_tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Delivers over an authenticated, STARTTLS-upgraded relay session.
///
/// Every dispatch opens its own session and closes it before returning.
pub struct SMTPMailer<C: SmtpConnector = LettreConnector> {
    config: SMTPConfig,
    connector: Arc<C>,
}

impl<C: SmtpConnector> Clone for SMTPMailer<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            connector: Arc::clone(&self.connector),
        }
    }
}

impl<C: SmtpConnector> fmt::Debug for SMTPMailer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SMTPMailer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SMTPMailer {
    /// Create a new SMTP mailer backed by lettre
    pub fn new(config: SMTPConfig) -> Self {
        Self::with_connector(config, LettreConnector)
    }
}

impl<C: SmtpConnector> SMTPMailer<C> {
    /// Create a new SMTP mailer with a custom connector
    pub fn with_connector(config: SMTPConfig, connector: C) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
        }
    }
}

/// Serialize a message as `multipart/alternative`: the plain part, then HTML if present
fn build_email(message: &Message) -> Result<lettre::Message, String> {
    let mut builder = lettre::Message::builder()
        .from(
            message
                .sender()
                .parse()
                .map_err(|e| format!("invalid sender \"{}\": {e}", message.sender()))?,
        )
        .subject(message.subject());

    for recipient in message.recipients() {
        builder = builder.to(recipient
            .parse()
            .map_err(|e| format!("invalid recipient \"{recipient}\": {e}"))?);
    }

    let plain = SinglePart::plain(message.body().to_string());

    let body = match message.html_body() {
        Some(html) => MultiPart::alternative()
            .singlepart(plain)
            .singlepart(SinglePart::html(html.to_string())),
        None => MultiPart::alternative().singlepart(plain),
    };

    builder
        .multipart(body)
        .map_err(|e| format!("could not build message: {e}"))
}

/// Run one session against the relay. The guard closes it on every return path.
fn deliver(connector: &dyn SmtpConnector, config: &SMTPConfig, email: &lettre::Message) -> Outcome {
    let mut session = match connector.connect(config) {
        Ok(session) => SessionGuard::new(session),
        Err(e) => {
            warn!("SMTP connect failed: {e}");
            return Outcome::failed(format!("connection_failed: {e}"));
        }
    };

    if let Err(e) = session.starttls() {
        warn!("SMTP STARTTLS failed: {e}");
        return Outcome::failed("tls_upgrade_failed");
    }

    let credentials = Credentials::new(config.username.clone(), config.password.clone());

    if let Err(e) = session.login(&credentials) {
        warn!("SMTP login failed: {e}");
        return Outcome::failed("auth_failed");
    }

    match session.send(email) {
        Ok(()) => {
            debug!("message accepted by {}", config.host);
            Outcome::sent(None)
        }
        Err(e) => {
            warn!("SMTP send failed: {e}");
            Outcome::failed(e.to_string())
        }
    }
}

#[async_trait]
impl<C: SmtpConnector> Mailer for SMTPMailer<C> {
    async fn dispatch(&self, message: &Message) -> Outcome {
        let email = match build_email(message) {
            Ok(email) => email,
            Err(reason) => return Outcome::failed(reason),
        };

        let connector = Arc::clone(&self.connector);
        let config = self.config.clone();

        match tokio::task::spawn_blocking(move || deliver(connector.as_ref(), &config, &email)).await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("SMTP delivery task failed: {e}");
                Outcome::failed(format!("smtp delivery task failed: {e}"))
            }
        }
    }
}
