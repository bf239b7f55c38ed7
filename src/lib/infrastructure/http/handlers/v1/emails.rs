//! Email dispatch and history handlers

use axum::http::HeaderMap;

pub mod list_emails;
pub mod send_email;

/// Header carrying the caller's identity, set by whatever authenticates requests
pub const REQUESTED_BY_HEADER: &str = "x-requested-by";

const ANONYMOUS: &str = "anonymous";

/// The caller's identity, or `anonymous`
pub fn requested_by(headers: &HeaderMap) -> String {
    headers
        .get(REQUESTED_BY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}
