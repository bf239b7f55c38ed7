//! Mail-domain DNS records: planning what to publish and checking what is live

mod planner;
mod records;
mod repository;
mod service;
mod verifier;

pub mod errors;

pub use planner::DnsRecordPlanner;
pub use records::{DnsRecord, DnsRecordKind, DnsRecordSpec, RecordPayload, VerificationStatus};
pub use repository::DnsRecordRepository;
pub use service::{DnsService, DnsServiceImpl, PlannedRecord};
pub use verifier::{DnsLookup, DnsVerifier, MxRecord, ResolverFailure, VerificationReport};

#[cfg(test)]
pub mod tests {
    pub use super::repository::MockDnsRecordRepository;
    pub use super::service::MockDnsService;
    pub use super::verifier::MockDnsLookup;
}
