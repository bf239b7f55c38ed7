//! DNS record repository module

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::mock;

use super::{errors::DnsRecordError, DnsRecord, DnsRecordSpec};

/// Store of planned records and their verification state
#[async_trait]
pub trait DnsRecordRepository: Clone + Send + Sync + 'static {
    /// Store a planned record, unverified
    async fn create_record(&self, spec: &DnsRecordSpec) -> Result<DnsRecord, DnsRecordError>;

    /// Every record for a domain, newest first
    async fn records_for_domain(&self, domain: &str) -> Result<Vec<DnsRecord>, DnsRecordError>;

    /// Mark every record for a domain as verified, returning how many were updated
    async fn mark_verified(
        &self,
        domain: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<u64, DnsRecordError>;
}

#[cfg(test)]
mock! {
    pub DnsRecordRepository {}

    impl Clone for DnsRecordRepository {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl DnsRecordRepository for DnsRecordRepository {
        async fn create_record(&self, spec: &DnsRecordSpec) -> Result<DnsRecord, DnsRecordError>;
        async fn records_for_domain(&self, domain: &str) -> Result<Vec<DnsRecord>, DnsRecordError>;
        async fn mark_verified(&self, domain: &str, verified_at: DateTime<Utc>) -> Result<u64, DnsRecordError>;
    }
}
