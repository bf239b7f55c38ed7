//! Error types for DNS record management

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when planning, storing or verifying DNS records
#[derive(Debug, Error)]
pub enum DnsRecordError {
    /// No mail server was given for an MX record
    #[error("a mail server is required")]
    EmptyMailServer,

    /// No allowed sending hosts were given for an SPF record
    #[error("at least one allowed server is required")]
    EmptyServerList,

    /// No DKIM selector was given
    #[error("a DKIM selector is required")]
    EmptySelector,

    /// No DKIM value was given
    #[error("a DKIM value is required")]
    EmptyDkimValue,

    /// A stored record kind was not recognised
    #[error("unknown record kind \"{0}\"")]
    UnknownKind(String),

    /// A stored record could not be read back
    #[error("record \"{0}\" is corrupt")]
    CorruptRecord(Uuid),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}
