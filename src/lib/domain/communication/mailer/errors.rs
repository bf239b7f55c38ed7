//! Mailer errors

use thiserror::Error;

/// Malformed input detected while building a [`super::Message`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    /// No recipients were left after splitting and trimming
    #[error("at least one recipient is required")]
    EmptyRecipientList,
}

/// Missing or contradictory provider settings.
///
/// Raised once when a transport is constructed and treated as fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Neither a connection string nor an endpoint and key pair was given
    #[error("email provider credentials are not configured: set a connection string, or an endpoint and API key")]
    MissingCredentials,

    /// A connection string and an endpoint/key pair were both given
    #[error("email provider credentials are ambiguous: set either a connection string or an endpoint and API key, not both")]
    AmbiguousCredentials,

    /// The connection string is missing a required key
    #[error("email provider connection string is missing \"{0}\"")]
    MalformedConnectionString(&'static str),

    /// The access key is not valid base64
    #[error("email provider access key is not valid base64")]
    InvalidAccessKey,

    /// The endpoint is not an absolute http(s) URL
    #[error("email provider endpoint \"{0}\" is not a valid URL")]
    InvalidEndpoint(String),
}
