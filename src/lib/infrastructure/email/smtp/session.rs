//! SMTP sessions

use std::{
    fmt,
    ops::{Deref, DerefMut},
    time::Duration,
};

use lettre::transport::smtp::{
    authentication::{Credentials, Mechanism},
    client::{SmtpConnection, TlsParameters},
    extension::ClientId,
};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
use mockall::mock;

use super::SMTPConfig;

/// A failure at one step of an SMTP session
#[derive(Debug, Error)]
pub enum SmtpSessionError {
    /// The relay could not be reached
    #[error("could not connect to {0}")]
    Connect(String),

    /// The relay does not offer STARTTLS
    #[error("the server does not support STARTTLS")]
    TlsUnsupported,

    /// The TLS handshake failed
    #[error("TLS upgrade failed: {0}")]
    Tls(String),

    /// The relay rejected the credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The relay rejected the message
    #[error("{0}")]
    Send(String),
}

/// One open connection to a relay
pub trait SmtpSession: Send {
    /// Upgrade the connection with STARTTLS
    fn starttls(&mut self) -> Result<(), SmtpSessionError>;

    /// Authenticate
    fn login(&mut self, credentials: &Credentials) -> Result<(), SmtpSessionError>;

    /// Submit a formatted message
    fn send(&mut self, email: &lettre::Message) -> Result<(), SmtpSessionError>;

    /// Release the connection
    fn close(&mut self);
}

/// Opens sessions to the configured relay
pub trait SmtpConnector: Send + Sync + 'static {
    /// Connect and greet the relay
    fn connect(&self, config: &SMTPConfig) -> Result<Box<dyn SmtpSession>, SmtpSessionError>;
}

#[cfg(test)]
mock! {
    pub SmtpSession {}

    impl SmtpSession for SmtpSession {
        fn starttls(&mut self) -> Result<(), SmtpSessionError>;
        fn login(&mut self, credentials: &Credentials) -> Result<(), SmtpSessionError>;
        fn send(&mut self, email: &lettre::Message) -> Result<(), SmtpSessionError>;
        fn close(&mut self);
    }
}

#[cfg(test)]
mock! {
    pub SmtpConnector {}

    impl SmtpConnector for SmtpConnector {
        fn connect(&self, config: &SMTPConfig) -> Result<Box<dyn SmtpSession>, SmtpSessionError>;
    }
}

/// Owns a session and closes it exactly once when dropped
pub struct SessionGuard {
    session: Box<dyn SmtpSession>,
}

impl SessionGuard {
    /// Take ownership of an open session
    pub fn new(session: Box<dyn SmtpSession>) -> Self {
        Self { session }
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard").finish_non_exhaustive()
    }
}

impl Deref for SessionGuard {
    type Target = dyn SmtpSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
    }
}

/// Connects with lettre's low-level [`SmtpConnection`]
#[derive(Clone, Copy, Debug, Default)]
pub struct LettreConnector;

impl SmtpConnector for LettreConnector {
    #[mutants::skip]
    fn connect(&self, config: &SMTPConfig) -> Result<Box<dyn SmtpSession>, SmtpSessionError> {
        let address = format!("{}:{}", config.host, config.port);

        let hello_name = config
            .hello_name
            .clone()
            .map(ClientId::Domain)
            .unwrap_or_default();

        let tls_parameters = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| SmtpSessionError::Tls(e.to_string()))?;

        let connection = SmtpConnection::connect(
            address.as_str(),
            Some(Duration::from_secs(config.timeout_secs)),
            &hello_name,
            None,
            None,
        )
        .map_err(|e| SmtpSessionError::Connect(format!("{address}: {e}")))?;

        debug!("connected to {address}");

        Ok(Box::new(LettreSession {
            connection,
            tls_parameters,
            hello_name,
        }))
    }
}

struct LettreSession {
    connection: SmtpConnection,
    tls_parameters: TlsParameters,
    hello_name: ClientId,
}

impl SmtpSession for LettreSession {
    #[mutants::skip]
    fn starttls(&mut self) -> Result<(), SmtpSessionError> {
        if !self.connection.can_starttls() {
            return Err(SmtpSessionError::TlsUnsupported);
        }

        self.connection
            .starttls(&self.tls_parameters, &self.hello_name)
            .map_err(|e| SmtpSessionError::Tls(e.to_string()))
    }

    #[mutants::skip]
    fn login(&mut self, credentials: &Credentials) -> Result<(), SmtpSessionError> {
        self.connection
            .auth(&[Mechanism::Plain, Mechanism::Login], credentials)
            .map(|_| ())
            .map_err(|e| SmtpSessionError::Auth(e.to_string()))
    }

    #[mutants::skip]
    fn send(&mut self, email: &lettre::Message) -> Result<(), SmtpSessionError> {
        self.connection
            .send(email.envelope(), &email.formatted())
            .map(|_| ())
            .map_err(|e| SmtpSessionError::Send(e.to_string()))
    }

    #[mutants::skip]
    fn close(&mut self) {
        if let Err(e) = self.connection.quit() {
            debug!("QUIT failed, aborting connection: {e}");
            self.connection.abort();
        }
    }
}
