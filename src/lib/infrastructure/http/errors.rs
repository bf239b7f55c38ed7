//! API error-handling module

use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{
    communication::email_messages::errors::{EmailMessageError, SendEmailError},
    dns::errors::DnsRecordError,
};

/// An error response
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// The error message
    #[schema(example = "Internal server error")]
    pub error: String,
}

/// An error raised in the API
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApiError {
    /// The status code
    #[schema(example = 500, value_type = u16)]
    #[serde(with = "http_serde::status_code")]
    pub status: StatusCode,

    /// The error message
    #[schema(example = "Internal server error")]
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    /// Create a new unprocessable entity error
    pub fn new_422(message: &str) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Create new internal server error
    pub fn new_500(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// A downstream transport failed
    pub fn new_502(message: &str) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        unknown_error(&err)
    }
}

impl From<SendEmailError> for ApiError {
    fn from(err: SendEmailError) -> Self {
        match err {
            SendEmailError::InvalidSender(_)
            | SendEmailError::InvalidRecipient(_)
            | SendEmailError::EmptyRecipientList => ApiError::new_422(&err.to_string()),
            SendEmailError::NotRecorded(err) => err.into(),
        }
    }
}

impl From<EmailMessageError> for ApiError {
    fn from(err: EmailMessageError) -> Self {
        unknown_error(&err)
    }
}

impl From<DnsRecordError> for ApiError {
    fn from(err: DnsRecordError) -> Self {
        match err {
            DnsRecordError::EmptyMailServer
            | DnsRecordError::EmptyServerList
            | DnsRecordError::EmptySelector
            | DnsRecordError::EmptyDkimValue => ApiError::new_422(&err.to_string()),
            DnsRecordError::UnknownKind(_)
            | DnsRecordError::CorruptRecord(_)
            | DnsRecordError::UnknownError(_) => unknown_error(&err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), &rejection.body_text())
    }
}

/// Log the cause and return a generic message
fn unknown_error(err: &dyn fmt::Display) -> ApiError {
    error!("{err}");

    ApiError::new_500("An unknown error occurred, please try again")
}
