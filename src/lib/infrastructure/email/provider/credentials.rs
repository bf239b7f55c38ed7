//! Provider credentials

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Url;

use crate::domain::communication::mailer::ConfigurationError;

use super::ProviderConfig;

/// The two mutually exclusive ways of configuring the provider
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderCredentials {
    /// `endpoint=https://...;accesskey=...`
    ConnectionString(String),

    /// An endpoint URL and a base64 access key
    EndpointKey {
        /// Resource endpoint
        endpoint: String,

        /// Base64 access key
        api_key: String,
    },
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionString(_) => f.write_str("ConnectionString(********)"),
            Self::EndpointKey { endpoint, .. } => f
                .debug_struct("EndpointKey")
                .field("endpoint", endpoint)
                .field("api_key", &"********")
                .finish(),
        }
    }
}

/// Credentials ready for request signing
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    /// Resource endpoint, always ending in `/`
    pub endpoint: Url,

    /// Decoded HMAC key
    pub access_key: Vec<u8>,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ProviderCredentials {
    /// Pick the configured mode, failing if none or both are set
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigurationError> {
        let connection_string = non_empty(&config.connection_string);
        let endpoint = non_empty(&config.endpoint);
        let api_key = non_empty(&config.api_key);

        match (connection_string, endpoint, api_key) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                Err(ConfigurationError::AmbiguousCredentials)
            }
            (Some(connection_string), None, None) => {
                Ok(Self::ConnectionString(connection_string.to_string()))
            }
            (None, Some(endpoint), Some(api_key)) => Ok(Self::EndpointKey {
                endpoint: endpoint.to_string(),
                api_key: api_key.to_string(),
            }),
            _ => Err(ConfigurationError::MissingCredentials),
        }
    }

    /// Parse and decode into an endpoint URL and HMAC key
    pub fn resolve(&self) -> Result<ResolvedCredentials, ConfigurationError> {
        let (endpoint, api_key) = match self {
            Self::ConnectionString(raw) => parse_connection_string(raw)?,
            Self::EndpointKey { endpoint, api_key } => (endpoint.clone(), api_key.clone()),
        };

        let with_slash = if endpoint.ends_with('/') {
            endpoint.clone()
        } else {
            format!("{endpoint}/")
        };

        let endpoint = Url::parse(&with_slash)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
            .ok_or(ConfigurationError::InvalidEndpoint(endpoint))?;

        let access_key = STANDARD
            .decode(api_key.trim())
            .map_err(|_| ConfigurationError::InvalidAccessKey)?;

        Ok(ResolvedCredentials {
            endpoint,
            access_key,
        })
    }
}

/// Split `endpoint=...;accesskey=...`; keys are case-insensitive and may come in any order
fn parse_connection_string(raw: &str) -> Result<(String, String), ConfigurationError> {
    let mut endpoint = None;
    let mut access_key = None;

    for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        // Access keys are base64 and may end in '=', so split on the first '=' only.
        if let Some((key, value)) = pair.split_once('=') {
            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.trim().to_string()),
                "accesskey" => access_key = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let endpoint = endpoint.ok_or(ConfigurationError::MalformedConnectionString("endpoint"))?;
    let access_key =
        access_key.ok_or(ConfigurationError::MalformedConnectionString("accesskey"))?;

    Ok((endpoint, access_key))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const KEY: &str = "c2VjcmV0LWtleQ==";

    fn config(
        connection_string: Option<&str>,
        endpoint: Option<&str>,
        api_key: Option<&str>,
    ) -> ProviderConfig {
        ProviderConfig {
            connection_string: connection_string.map(String::from),
            endpoint: endpoint.map(String::from),
            api_key: api_key.map(String::from),
            poll_interval_ms: 1000,
        }
    }

    #[test]
    fn test_connection_string_mode() -> TestResult {
        let raw = format!("endpoint=https://mail.example.net/;accesskey={KEY}");

        let credentials = ProviderCredentials::from_config(&config(Some(&raw), None, None))?;

        assert_eq!(credentials, ProviderCredentials::ConnectionString(raw));

        let resolved = credentials.resolve()?;

        assert_eq!(resolved.endpoint.as_str(), "https://mail.example.net/");
        assert_eq!(resolved.access_key, b"secret-key");

        Ok(())
    }

    #[test]
    fn test_connection_string_keys_are_case_insensitive_and_unordered() -> TestResult {
        let raw = format!("AccessKey={KEY}; Endpoint=https://mail.example.net");

        let resolved = ProviderCredentials::ConnectionString(raw).resolve()?;

        assert_eq!(resolved.endpoint.as_str(), "https://mail.example.net/");
        assert_eq!(resolved.access_key, b"secret-key");

        Ok(())
    }

    #[test]
    fn test_endpoint_key_mode() -> TestResult {
        let credentials = ProviderCredentials::from_config(&config(
            None,
            Some("https://mail.example.net"),
            Some(KEY),
        ))?;

        assert!(matches!(credentials, ProviderCredentials::EndpointKey { .. }));
        assert_eq!(
            credentials.resolve()?.endpoint.as_str(),
            "https://mail.example.net/"
        );

        Ok(())
    }

    #[test]
    fn test_missing_credentials() {
        assert_eq!(
            ProviderCredentials::from_config(&config(None, None, None)),
            Err(ConfigurationError::MissingCredentials)
        );
        assert_eq!(
            ProviderCredentials::from_config(&config(None, Some("https://mail.example.net"), None)),
            Err(ConfigurationError::MissingCredentials)
        );
        assert_eq!(
            ProviderCredentials::from_config(&config(Some("  "), None, Some(""))),
            Err(ConfigurationError::MissingCredentials)
        );
    }

    #[test]
    fn test_ambiguous_credentials() {
        assert_eq!(
            ProviderCredentials::from_config(&config(
                Some("endpoint=https://a/;accesskey=b"),
                Some("https://mail.example.net"),
                Some(KEY),
            )),
            Err(ConfigurationError::AmbiguousCredentials)
        );
    }

    #[test]
    fn test_malformed_connection_string() {
        assert_eq!(
            ProviderCredentials::ConnectionString(format!("accesskey={KEY}")).resolve(),
            Err(ConfigurationError::MalformedConnectionString("endpoint"))
        );
        assert_eq!(
            ProviderCredentials::ConnectionString("endpoint=https://a.example".to_string())
                .resolve(),
            Err(ConfigurationError::MalformedConnectionString("accesskey"))
        );
    }

    #[test]
    fn test_invalid_key_and_endpoint() {
        let bad_key = ProviderCredentials::EndpointKey {
            endpoint: "https://mail.example.net".to_string(),
            api_key: "not base64!".to_string(),
        };
        assert_eq!(bad_key.resolve(), Err(ConfigurationError::InvalidAccessKey));

        let bad_endpoint = ProviderCredentials::EndpointKey {
            endpoint: "mail.example.net".to_string(),
            api_key: KEY.to_string(),
        };
        assert!(matches!(
            bad_endpoint.resolve(),
            Err(ConfigurationError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credentials = ProviderCredentials::EndpointKey {
            endpoint: "https://mail.example.net".to_string(),
            api_key: KEY.to_string(),
        };

        assert!(!format!("{credentials:?}").contains(KEY));
    }
}
