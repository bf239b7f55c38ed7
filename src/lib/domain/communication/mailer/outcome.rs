//! Dispatch outcome

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The classified result of a dispatch attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The transport accepted the message
    Sent {
        /// The provider's id for the message, if the transport has one
        provider_message_id: Option<String>,
    },

    /// The message could not be delivered
    Failed {
        /// Why delivery failed
        reason: String,
    },
}

impl Outcome {
    /// A successful dispatch
    pub fn sent(provider_message_id: Option<String>) -> Self {
        Self::Sent {
            provider_message_id,
        }
    }

    /// A failed dispatch
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Whether the message was sent
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// The failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Sent { .. } => None,
            Self::Failed { reason } => Some(reason),
        }
    }

    /// The provider message id, if any
    pub fn provider_message_id(&self) -> Option<&str> {
        match self {
            Self::Sent {
                provider_message_id,
            } => provider_message_id.as_deref(),
            Self::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::sent(Some("abc".to_string()))).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "status": "SENT", "provider_message_id": "abc" })
        );

        let json = serde_json::to_value(Outcome::failed("auth_failed")).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "status": "FAILED", "reason": "auth_failed" })
        );
    }

    #[test]
    fn test_accessors() {
        let sent = Outcome::sent(None);
        assert!(sent.is_sent());
        assert_eq!(sent.reason(), None);
        assert_eq!(sent.provider_message_id(), None);

        let failed = Outcome::failed("tls_upgrade_failed");
        assert!(!failed.is_sent());
        assert_eq!(failed.reason(), Some("tls_upgrade_failed"));
    }
}
