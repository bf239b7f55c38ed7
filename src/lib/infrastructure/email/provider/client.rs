//! REST client for the provider's asynchronous send API

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{header::HeaderMap, Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
use mockall::mock;

use super::credentials::ResolvedCredentials;

const API_VERSION: &str = "2023-03-31";

type HmacSha256 = Hmac<Sha256>;

/// Errors talking to the provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request could not be made or the response could not be read
    #[error("request to email provider failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error status
    #[error("email provider returned {status}: {message}")]
    Rejected {
        /// HTTP status
        status: u16,

        /// Provider's message, or the raw body
        message: String,
    },

    /// A send was accepted but no operation id came back
    #[error("email provider did not return an operation id")]
    MissingOperationId,

    /// The request URL could not be built
    #[error("invalid email provider URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be encoded
    #[error("could not encode email provider request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A recipient address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecipient {
    /// The address
    pub address: String,
}

/// Recipient lists by header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients {
    /// `To:` recipients, in order
    pub to: Vec<EmailRecipient>,
}

/// Message content
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailContent {
    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub plain_text: String,

    /// HTML body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Body of a send request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Sender address
    pub sender_address: String,

    /// Recipients
    pub recipients: Recipients,

    /// Content
    pub content: EmailContent,
}

/// Status of a send operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    /// Queued
    NotStarted,

    /// In progress
    Running,

    /// Delivered to the provider's outbound pipeline
    Succeeded,

    /// The provider gave up
    Failed,

    /// The operation was cancelled
    Canceled,
}

impl OperationStatus {
    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// Provider error detail
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error code
    #[serde(default)]
    pub code: Option<String>,

    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

/// Current state of a send operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationState {
    /// Operation id, also the message id
    pub id: String,

    /// Status
    pub status: OperationStatus,

    /// Set when the operation failed
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

/// The provider's send-and-poll API
#[async_trait]
pub trait EmailClient: Send + Sync + 'static {
    /// Submit a message, returning the operation id to poll
    async fn begin_send(&self, request: &SendRequest) -> Result<String, ProviderError>;

    /// Fetch the current state of an operation
    async fn poll(&self, operation_id: &str) -> Result<OperationState, ProviderError>;
}

#[cfg(test)]
mock! {
    pub EmailClient {}

    #[async_trait]
    impl EmailClient for EmailClient {
        async fn begin_send(&self, request: &SendRequest) -> Result<String, ProviderError>;
        async fn poll(&self, operation_id: &str) -> Result<OperationState, ProviderError>;
    }
}

/// Headers that authenticate one request
#[derive(Debug, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `x-ms-date`
    pub date: String,

    /// `x-ms-content-sha256`
    pub content_hash: String,

    /// `Authorization`
    pub authorization: String,
}

/// HMAC-SHA256 request signing over method, path, date, host and body hash
pub fn sign(
    access_key: &[u8],
    method: &Method,
    url: &Url,
    body: &[u8],
    date: &str,
) -> SignedHeaders {
    let content_hash = STANDARD.encode(Sha256::digest(body));

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    };

    let path_and_query = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };

    let string_to_sign = format!("{method}\n{path_and_query}\n{date};{host};{content_hash}");

    let mut mac = HmacSha256::new_from_slice(access_key).expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    SignedHeaders {
        date: date.to_string(),
        content_hash,
        authorization: format!(
            "HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature={signature}"
        ),
    }
}

/// A signed request, ready to go on the wire
#[derive(Debug)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: Method,

    /// Full URL including `api-version`
    pub url: Url,

    /// Authentication headers
    pub headers: SignedHeaders,

    /// JSON body, empty for polls
    pub body: Vec<u8>,
}

/// The operation id from an accepted send: the body's `id`, else the last
/// path segment of `Operation-Location`
fn operation_id(headers: &HeaderMap, body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Accepted {
        id: Option<String>,
    }

    serde_json::from_str::<Accepted>(body)
        .ok()
        .and_then(|accepted| accepted.id)
        .filter(|id| !id.is_empty())
        .or_else(|| {
            let location = headers.get("operation-location")?.to_str().ok()?;
            let url = Url::parse(location).ok()?;
            url.path_segments()?
                .last()
                .filter(|id| !id.is_empty())
                .map(String::from)
        })
}

fn rejection(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error.message)
        .unwrap_or_else(|| body.to_string());

    ProviderError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// Talks to the provider over HTTPS with signed requests
#[derive(Debug, Clone)]
pub struct RestEmailClient {
    http: Client,
    credentials: ResolvedCredentials,
}

impl RestEmailClient {
    /// Create a client for resolved credentials
    pub fn new(http: Client, credentials: ResolvedCredentials) -> Self {
        Self { http, credentials }
    }

    /// `path` is resolved against the endpoint, which always ends in `/`
    fn url(&self, path: &str) -> Result<Url, ProviderError> {
        let mut url = self
            .credentials
            .endpoint
            .join(&format!("./{path}"))
            .map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;

        url.query_pairs_mut().append_pair("api-version", API_VERSION);

        Ok(url)
    }

    fn prepare(&self, method: Method, url: Url, body: Vec<u8>, date: &str) -> PreparedRequest {
        let headers = sign(&self.credentials.access_key, &method, &url, &body, date);

        PreparedRequest {
            method,
            url,
            headers,
            body,
        }
    }

    /// `POST emails:send` for a message
    pub fn send_request(
        &self,
        request: &SendRequest,
        date: &str,
    ) -> Result<PreparedRequest, ProviderError> {
        let url = self.url("emails:send")?;
        let body = serde_json::to_vec(request)?;

        Ok(self.prepare(Method::POST, url, body, date))
    }

    /// `GET emails/operations/{id}` for a pending send
    pub fn poll_request(
        &self,
        operation_id: &str,
        date: &str,
    ) -> Result<PreparedRequest, ProviderError> {
        let url = self.url(&format!("emails/operations/{operation_id}"))?;

        Ok(self.prepare(Method::GET, url, Vec::new(), date))
    }

    #[mutants::skip]
    async fn execute(
        &self,
        request: PreparedRequest,
    ) -> Result<(StatusCode, HeaderMap, String), ProviderError> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
        } = request;

        debug!("{method} {url}");

        let response = self
            .http
            .request(method, url)
            .header("x-ms-date", headers.date)
            .header("x-ms-content-sha256", headers.content_hash)
            .header("Authorization", headers.authorization)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        Ok((status, headers, text))
    }
}

fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[async_trait]
impl EmailClient for RestEmailClient {
    #[mutants::skip]
    async fn begin_send(&self, request: &SendRequest) -> Result<String, ProviderError> {
        let prepared = self.send_request(request, &http_date())?;

        let (status, headers, text) = self.execute(prepared).await?;

        if !status.is_success() {
            return Err(rejection(status, &text));
        }

        operation_id(&headers, &text).ok_or(ProviderError::MissingOperationId)
    }

    #[mutants::skip]
    async fn poll(&self, operation_id: &str) -> Result<OperationState, ProviderError> {
        let prepared = self.poll_request(operation_id, &http_date())?;

        let (status, _, text) = self.execute(prepared).await?;

        if !status.is_success() {
            return Err(rejection(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| ProviderError::Rejected {
            status: status.as_u16(),
            message: format!("unreadable operation status: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;
    use testresult::TestResult;

    use super::*;

    const DATE: &str = "Tue, 01 Oct 2024 12:00:00 GMT";

    fn client(endpoint: &str) -> TestResult<RestEmailClient> {
        Ok(RestEmailClient::new(
            Client::new(),
            ResolvedCredentials {
                endpoint: Url::parse(endpoint)?,
                access_key: b"secret-key".to_vec(),
            },
        ))
    }

    fn message() -> SendRequest {
        SendRequest {
            sender_address: "a@x.com".to_string(),
            recipients: Recipients {
                to: vec![EmailRecipient {
                    address: "b@x.com".to_string(),
                }],
            },
            content: EmailContent {
                subject: "Hi".to_string(),
                plain_text: "Hello".to_string(),
                html: None,
            },
        }
    }

    #[test]
    fn test_send_request_shape() -> TestResult {
        let request = message();

        assert_eq!(
            serde_json::to_value(&request)?,
            serde_json::json!({
                "senderAddress": "a@x.com",
                "recipients": { "to": [{ "address": "b@x.com" }] },
                "content": { "subject": "Hi", "plainText": "Hello" }
            })
        );

        Ok(())
    }

    #[test]
    fn test_send_request_targets_endpoint() -> TestResult {
        let client = client("https://mail.example.net/")?;

        let prepared = client.send_request(&message(), DATE)?;

        assert_eq!(prepared.method, Method::POST);
        assert_eq!(
            prepared.url.as_str(),
            "https://mail.example.net/emails:send?api-version=2023-03-31"
        );
        assert_eq!(prepared.body, serde_json::to_vec(&message())?);
        assert_eq!(
            prepared.headers.content_hash,
            STANDARD.encode(Sha256::digest(&prepared.body))
        );
        assert_eq!(
            prepared.headers,
            sign(b"secret-key", &Method::POST, &prepared.url, &prepared.body, DATE)
        );

        Ok(())
    }

    #[test]
    fn test_send_request_keeps_endpoint_path() -> TestResult {
        let client = client("https://gateway.example.net/mail/")?;

        assert_eq!(
            client.send_request(&message(), DATE)?.url.as_str(),
            "https://gateway.example.net/mail/emails:send?api-version=2023-03-31"
        );

        Ok(())
    }

    #[test]
    fn test_poll_request_targets_operation() -> TestResult {
        let client = client("https://mail.example.net/")?;

        let prepared = client.poll_request("op-1", DATE)?;

        assert_eq!(prepared.method, Method::GET);
        assert_eq!(
            prepared.url.as_str(),
            "https://mail.example.net/emails/operations/op-1?api-version=2023-03-31"
        );
        assert!(prepared.body.is_empty());
        assert_eq!(
            prepared.headers.content_hash,
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );

        Ok(())
    }

    #[test]
    fn test_sign_hashes_body() -> TestResult {
        let url = Url::parse("https://mail.example.net/emails:send?api-version=2023-03-31")?;

        let signed = sign(b"secret-key", &Method::POST, &url, b"", DATE);

        assert_eq!(
            signed.content_hash,
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
        assert_eq!(signed.date, DATE);
        assert!(signed.authorization.starts_with(
            "HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature="
        ));

        Ok(())
    }

    #[test]
    fn test_signature_covers_date_path_and_key() -> TestResult {
        let url = Url::parse("https://mail.example.net/emails:send?api-version=2023-03-31")?;
        let other_url = Url::parse("https://mail.example.net/emails/operations/1?api-version=2023-03-31")?;

        let signed = sign(b"secret-key", &Method::POST, &url, b"{}", DATE);

        assert_eq!(signed, sign(b"secret-key", &Method::POST, &url, b"{}", DATE));
        assert_ne!(
            signed.authorization,
            sign(b"secret-key", &Method::POST, &url, b"{}", "Wed, 02 Oct 2024 12:00:00 GMT")
                .authorization
        );
        assert_ne!(
            signed.authorization,
            sign(b"secret-key", &Method::POST, &other_url, b"{}", DATE).authorization
        );
        assert_ne!(
            signed.authorization,
            sign(b"other-key", &Method::POST, &url, b"{}", DATE).authorization
        );

        Ok(())
    }

    #[test]
    fn test_operation_id_from_body_or_header() {
        let mut headers = HeaderMap::new();

        assert_eq!(
            operation_id(&headers, r#"{"id":"op-1","status":"Running"}"#),
            Some("op-1".to_string())
        );

        headers.insert(
            "operation-location",
            HeaderValue::from_static(
                "https://mail.example.net/emails/operations/op-2?api-version=2023-03-31",
            ),
        );

        assert_eq!(operation_id(&headers, ""), Some("op-2".to_string()));
        assert_eq!(operation_id(&HeaderMap::new(), "{}"), None);
    }

    #[test]
    fn test_rejection_prefers_provider_message() {
        let err = rejection(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"code":"Denied","message":"Denied by the resource provider."}}"#,
        );

        assert_eq!(
            err.to_string(),
            "email provider returned 401: Denied by the resource provider."
        );

        let err = rejection(StatusCode::BAD_GATEWAY, "upstream down");

        assert_eq!(err.to_string(), "email provider returned 502: upstream down");
    }

    #[test]
    fn test_encode_errors_are_not_url_errors() {
        let err = ProviderError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());

        assert!(matches!(err, ProviderError::Encode(_)));
        assert!(err
            .to_string()
            .starts_with("could not encode email provider request"));
    }

    #[test]
    fn test_operation_state_parses() -> TestResult {
        let state: OperationState = serde_json::from_str(
            r#"{"id":"op-1","status":"Failed","error":{"code":"EmailDroppedAllRecipientsSuppressed","message":"suppressed"}}"#,
        )?;

        assert_eq!(state.status, OperationStatus::Failed);
        assert!(state.status.is_terminal());
        assert!(!OperationStatus::Running.is_terminal());
        assert_eq!(
            state.error.and_then(|e| e.message).as_deref(),
            Some("suppressed")
        );

        Ok(())
    }
}
