//! DNS record service

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

#[cfg(test)]
use mockall::mock;

use super::{
    errors::DnsRecordError, DnsLookup, DnsRecord, DnsRecordPlanner, DnsRecordRepository,
    DnsRecordSpec, DnsVerifier, VerificationReport,
};

/// A stored record and a sentence describing it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedRecord {
    /// The stored record
    pub record: DnsRecord,

    /// e.g. `Created SPF record for example.com: v=spf1 a.com -all`
    pub message: String,
}

/// DNS record service
#[async_trait]
pub trait DnsService: Clone + Send + Sync + 'static {
    /// The mail domain this service manages
    fn domain(&self) -> String;

    /// Plans and stores an MX record.
    ///
    /// # Arguments
    /// * `mail_server` - The exchange host.
    /// * `priority` - The MX preference.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] containing the [`PlannedRecord`] once stored.
    /// Success means the record was stored, not that it is published.
    async fn plan_mx(&self, mail_server: &str, priority: u16)
        -> Result<PlannedRecord, DnsRecordError>;

    /// Plans and stores an SPF record allowing `allowed_servers`.
    async fn plan_spf(&self, allowed_servers: &[String]) -> Result<PlannedRecord, DnsRecordError>;

    /// Plans and stores a DKIM record.
    async fn plan_dkim(&self, selector: &str, value: &str)
        -> Result<PlannedRecord, DnsRecordError>;

    /// Runs a live verification pass.
    ///
    /// When every query succeeds all stored records for the domain are marked
    /// verified. That criterion is query success, not record correctness.
    async fn verify(&self) -> Result<VerificationReport, DnsRecordError>;

    /// Stored records for the domain, newest first.
    async fn list_records(&self) -> Result<Vec<DnsRecord>, DnsRecordError>;
}

#[cfg(test)]
mock! {
    pub DnsService {}

    impl Clone for DnsService {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl DnsService for DnsService {
        fn domain(&self) -> String;
        async fn plan_mx(&self, mail_server: &str, priority: u16) -> Result<PlannedRecord, DnsRecordError>;
        async fn plan_spf(&self, allowed_servers: &[String]) -> Result<PlannedRecord, DnsRecordError>;
        async fn plan_dkim(&self, selector: &str, value: &str) -> Result<PlannedRecord, DnsRecordError>;
        async fn verify(&self) -> Result<VerificationReport, DnsRecordError>;
        async fn list_records(&self) -> Result<Vec<DnsRecord>, DnsRecordError>;
    }
}

/// DNS record service implementation
#[derive(Debug)]
pub struct DnsServiceImpl<R, L>
where
    R: DnsRecordRepository,
    L: DnsLookup,
{
    repo: Arc<R>,
    planner: DnsRecordPlanner,
    verifier: DnsVerifier<L>,
}

impl<R, L> Clone for DnsServiceImpl<R, L>
where
    R: DnsRecordRepository,
    L: DnsLookup,
{
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            planner: self.planner.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

impl<R, L> DnsServiceImpl<R, L>
where
    R: DnsRecordRepository,
    L: DnsLookup,
{
    /// Create a new DNS record service
    pub fn new(repo: Arc<R>, planner: DnsRecordPlanner, verifier: DnsVerifier<L>) -> Self {
        Self {
            repo,
            planner,
            verifier,
        }
    }

    async fn store(&self, spec: DnsRecordSpec) -> Result<PlannedRecord, DnsRecordError> {
        let record = self.repo.create_record(&spec).await?;
        let message = spec.describe();

        info!(kind = %record.kind, name = %record.name, "planned DNS record");

        Ok(PlannedRecord { record, message })
    }
}

#[async_trait]
impl<R, L> DnsService for DnsServiceImpl<R, L>
where
    R: DnsRecordRepository,
    L: DnsLookup,
{
    fn domain(&self) -> String {
        self.planner.domain().to_string()
    }

    async fn plan_mx(
        &self,
        mail_server: &str,
        priority: u16,
    ) -> Result<PlannedRecord, DnsRecordError> {
        if mail_server.trim().is_empty() {
            return Err(DnsRecordError::EmptyMailServer);
        }

        self.store(self.planner.plan_mx(mail_server, priority))
            .await
    }

    async fn plan_spf(&self, allowed_servers: &[String]) -> Result<PlannedRecord, DnsRecordError> {
        self.store(self.planner.plan_spf(allowed_servers)?).await
    }

    async fn plan_dkim(
        &self,
        selector: &str,
        value: &str,
    ) -> Result<PlannedRecord, DnsRecordError> {
        self.store(self.planner.plan_dkim(selector, value)?).await
    }

    async fn verify(&self) -> Result<VerificationReport, DnsRecordError> {
        let domain = self.planner.domain();
        let report = self.verifier.verify(domain).await;

        if report.all_ok {
            let updated = self.repo.mark_verified(domain, Utc::now()).await?;
            info!("DNS verification for {domain} completed, {updated} record(s) marked verified");
        } else {
            warn!("DNS verification for {domain} had resolver failures");
        }

        Ok(report)
    }

    async fn list_records(&self) -> Result<Vec<DnsRecord>, DnsRecordError> {
        self.repo.records_for_domain(self.planner.domain()).await
    }
}
