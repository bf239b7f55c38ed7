//! DNS record specs and stored records

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DnsRecordError;

const DISPLAY_VALUE_LENGTH: usize = 30;

/// The kinds of authentication record this service plans
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordKind {
    /// Mail exchanger
    Mx,

    /// Sender Policy Framework (published as TXT)
    Spf,

    /// DomainKeys Identified Mail public key (published as TXT)
    Dkim,
}

impl DnsRecordKind {
    /// The stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mx => "MX",
            Self::Spf => "SPF",
            Self::Dkim => "DKIM",
        }
    }
}

impl fmt::Display for DnsRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DnsRecordKind {
    type Err = DnsRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MX" => Ok(Self::Mx),
            "SPF" => Ok(Self::Spf),
            "DKIM" => Ok(Self::Dkim),
            other => Err(DnsRecordError::UnknownKind(other.to_string())),
        }
    }
}

/// Kind-specific content of a planned record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordPayload {
    /// An MX record
    Mx {
        /// The exchange host
        mail_server: String,

        /// Preference, lower is tried first
        priority: u16,
    },

    /// An SPF policy
    Spf {
        /// Mechanisms allowed to send, e.g. `include:spf.example.net`
        allowed_servers: Vec<String>,
    },

    /// A DKIM key record
    Dkim {
        /// The selector the signer uses
        selector: String,

        /// The TXT payload, kept verbatim
        value: String,
    },
}

/// The intended content of a record before it is published.
///
/// Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsRecordSpec {
    domain: String,
    payload: RecordPayload,
}

impl DnsRecordSpec {
    pub(super) fn new(domain: &str, payload: RecordPayload) -> Self {
        Self {
            domain: domain.to_string(),
            payload,
        }
    }

    /// The mail domain the record belongs to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The kind-specific payload
    pub fn payload(&self) -> &RecordPayload {
        &self.payload
    }

    /// The record kind
    pub fn kind(&self) -> DnsRecordKind {
        match self.payload {
            RecordPayload::Mx { .. } => DnsRecordKind::Mx,
            RecordPayload::Spf { .. } => DnsRecordKind::Spf,
            RecordPayload::Dkim { .. } => DnsRecordKind::Dkim,
        }
    }

    /// The owner name the record is published under
    pub fn name(&self) -> String {
        match &self.payload {
            RecordPayload::Dkim { selector, .. } => {
                format!("{selector}._domainkey.{}", self.domain)
            }
            _ => self.domain.clone(),
        }
    }

    /// The record data as it is stored and published
    pub fn value(&self) -> String {
        match &self.payload {
            RecordPayload::Mx {
                mail_server,
                priority,
            } => format!("{priority} {mail_server}"),
            RecordPayload::Spf { allowed_servers } => {
                format!("v=spf1 {} -all", allowed_servers.join(" "))
            }
            RecordPayload::Dkim { value, .. } => value.clone(),
        }
    }

    /// A sentence describing the planned record
    pub fn describe(&self) -> String {
        match &self.payload {
            RecordPayload::Mx {
                mail_server,
                priority,
            } => format!(
                "Created MX record for {} pointing to {mail_server} with priority {priority}",
                self.domain
            ),
            RecordPayload::Spf { .. } => {
                format!("Created SPF record for {}: {}", self.domain, self.value())
            }
            RecordPayload::Dkim { .. } => format!("Created DKIM record for {}", self.name()),
        }
    }
}

/// The result of the most recent live check
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerificationStatus {
    /// Whether the last verification pass succeeded
    pub verified: bool,

    /// When the last successful pass ran
    pub last_verified_at: Option<DateTime<Utc>>,
}

/// A stored record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DnsRecord {
    /// Record id
    pub id: Uuid,

    /// The mail domain
    #[schema(example = "example.com")]
    pub domain: String,

    /// The owner name the record is published under
    #[schema(example = "selector1._domainkey.example.com")]
    pub name: String,

    /// The record kind
    pub kind: DnsRecordKind,

    /// The record data, never truncated
    #[schema(example = "v=spf1 include:spf.example.net -all")]
    pub value: String,

    /// When the record was planned
    pub created_at: DateTime<Utc>,

    /// Verification state
    #[serde(flatten)]
    pub status: VerificationStatus,
}

impl DnsRecord {
    /// The value shortened for listings. Storage always keeps the full value.
    pub fn display_value(&self) -> String {
        if self.value.chars().count() > DISPLAY_VALUE_LENGTH {
            let short: String = self.value.chars().take(DISPLAY_VALUE_LENGTH).collect();
            format!("{short}...")
        } else {
            self.value.clone()
        }
    }
}
