//! Live DNS verification

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

#[cfg(test)]
use mockall::mock;

/// A single resolved MX record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MxRecord {
    /// Preference, lower is tried first
    pub preference: u16,

    /// The exchange host as returned by the resolver
    pub exchange: String,
}

impl MxRecord {
    /// Create an MX record
    pub fn new(preference: u16, exchange: &str) -> Self {
        Self {
            preference,
            exchange: exchange.to_string(),
        }
    }
}

/// A DNS query for one record type failed
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ResolverFailure(pub String);

/// Client-side resolution of the record types the verifier checks.
///
/// An empty answer is `Ok(vec![])`, not a failure.
#[async_trait]
pub trait DnsLookup: Clone + Send + Sync + 'static {
    /// Resolve MX records for `domain`
    async fn mx_lookup(&self, domain: &str) -> Result<Vec<MxRecord>, ResolverFailure>;

    /// Resolve TXT records for `domain`, one string per record
    async fn txt_lookup(&self, domain: &str) -> Result<Vec<String>, ResolverFailure>;
}

#[cfg(test)]
mock! {
    pub DnsLookup {}

    impl Clone for DnsLookup {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl DnsLookup for DnsLookup {
        async fn mx_lookup(&self, domain: &str) -> Result<Vec<MxRecord>, ResolverFailure>;
        async fn txt_lookup(&self, domain: &str) -> Result<Vec<String>, ResolverFailure>;
    }
}

/// The result of one verification pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerificationReport {
    /// True when every query completed.
    ///
    /// This reports query success only. It stays true when no MX records or no
    /// SPF record exist; read `results` to see what was actually found.
    pub all_ok: bool,

    /// One human-readable line per finding, in query order
    pub results: Vec<String>,
}

/// Checks a domain's published mail records against a live resolver
#[derive(Debug)]
pub struct DnsVerifier<L: DnsLookup> {
    lookup: Arc<L>,
}

impl<L: DnsLookup> Clone for DnsVerifier<L> {
    fn clone(&self) -> Self {
        Self {
            lookup: Arc::clone(&self.lookup),
        }
    }
}

impl<L: DnsLookup> DnsVerifier<L> {
    /// Create a verifier over a resolver
    pub fn new(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    /// Query MX then TXT for `domain`.
    ///
    /// A failed query is reported as a line and does not stop the pass.
    pub async fn verify(&self, domain: &str) -> VerificationReport {
        let mut results = Vec::new();

        let mx_ok = self.check_mx(domain, &mut results).await;
        let spf_ok = self.check_spf(domain, &mut results).await;

        VerificationReport {
            all_ok: mx_ok && spf_ok,
            results,
        }
    }

    async fn check_mx(&self, domain: &str, results: &mut Vec<String>) -> bool {
        match self.lookup.mx_lookup(domain).await {
            Ok(records) => {
                debug!("found {} MX record(s) for {domain}", records.len());

                results.push(format!(
                    "Found {} MX records for {domain}",
                    records.len()
                ));
                results.extend(records.iter().map(|mx| {
                    format!("Priority: {}, Server: {}", mx.preference, mx.exchange)
                }));

                true
            }
            Err(err) => {
                warn!("MX lookup failed for {domain}: {err}");

                results.push(format!("Error checking MX records: {err}"));

                false
            }
        }
    }

    async fn check_spf(&self, domain: &str, results: &mut Vec<String>) -> bool {
        match self.lookup.txt_lookup(domain).await {
            Ok(records) => {
                let before = results.len();

                results.extend(
                    records
                        .iter()
                        .filter(|txt| txt.starts_with("v=spf1"))
                        .map(|spf| format!("Found SPF record: {spf}")),
                );

                if results.len() == before {
                    debug!("no SPF record among {} TXT record(s) for {domain}", records.len());

                    results.push("No SPF record found".to_string());
                }

                true
            }
            Err(err) => {
                warn!("TXT lookup failed for {domain}: {err}");

                results.push(format!("Error checking SPF records: {err}"));

                false
            }
        }
    }
}
