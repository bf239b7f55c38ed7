//! Error types for sending and recording email

use thiserror::Error;
use tracing::debug;

use crate::domain::communication::{email_addresses::EmailAddressError, mailer::MessageError};

/// Errors that can occur when storing or reading sent-email records
#[derive(Debug, Error)]
pub enum EmailMessageError {
    /// A stored status was not recognised
    #[error("unknown email status \"{0}\"")]
    UnknownStatus(String),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Errors that stop an email from being dispatched or recorded.
///
/// A transport failure is not one of these: it is a normal
/// [`crate::domain::communication::mailer::Outcome::Failed`].
#[derive(Debug, Error)]
pub enum SendEmailError {
    /// The sender address is not valid
    #[error("invalid sender: {0}")]
    InvalidSender(EmailAddressError),

    /// One of the recipient addresses is not valid
    #[error("invalid recipient: {0}")]
    InvalidRecipient(EmailAddressError),

    /// No recipients were given
    #[error("at least one recipient is required")]
    EmptyRecipientList,

    /// The attempt could not be recorded
    #[error("could not record the email: {0}")]
    NotRecorded(EmailMessageError),
}

impl From<MessageError> for SendEmailError {
    fn from(err: MessageError) -> Self {
        debug!("MessageError -> SendEmailError");

        match err {
            MessageError::EmptyRecipientList => SendEmailError::EmptyRecipientList,
        }
    }
}

impl From<EmailMessageError> for SendEmailError {
    fn from(err: EmailMessageError) -> Self {
        debug!("EmailMessageError -> SendEmailError");

        SendEmailError::NotRecorded(err)
    }
}
