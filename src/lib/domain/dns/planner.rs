//! DNS record planner

use super::{errors::DnsRecordError, DnsRecordSpec, RecordPayload};

/// Builds the records a domain owner has to publish.
///
/// Planning is local string construction only. No DNS provider is contacted,
/// so a planned record says nothing about what resolvers currently return.
#[derive(Clone, Debug)]
pub struct DnsRecordPlanner {
    domain: String,
}

impl DnsRecordPlanner {
    /// Create a planner for a mail domain
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.trim().to_string(),
        }
    }

    /// The mail domain records are planned for
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Plan an MX record
    pub fn plan_mx(&self, mail_server: &str, priority: u16) -> DnsRecordSpec {
        DnsRecordSpec::new(
            &self.domain,
            RecordPayload::Mx {
                mail_server: mail_server.trim().to_string(),
                priority,
            },
        )
    }

    /// Plan an SPF policy that allows `allowed_servers` and rejects everything else
    pub fn plan_spf<S: AsRef<str>>(
        &self,
        allowed_servers: &[S],
    ) -> Result<DnsRecordSpec, DnsRecordError> {
        let allowed_servers: Vec<String> = allowed_servers
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        if allowed_servers.is_empty() {
            return Err(DnsRecordError::EmptyServerList);
        }

        Ok(DnsRecordSpec::new(
            &self.domain,
            RecordPayload::Spf { allowed_servers },
        ))
    }

    /// Plan a DKIM key record. The value is stored exactly as given.
    pub fn plan_dkim(&self, selector: &str, value: &str) -> Result<DnsRecordSpec, DnsRecordError> {
        let selector = selector.trim();

        if selector.is_empty() {
            return Err(DnsRecordError::EmptySelector);
        }

        if value.trim().is_empty() {
            return Err(DnsRecordError::EmptyDkimValue);
        }

        Ok(DnsRecordSpec::new(
            &self.domain,
            RecordPayload::Dkim {
                selector: selector.to_string(),
                value: value.to_string(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::dns::DnsRecordKind;

    use super::*;

    #[test]
    fn test_plan_mx_is_local_only() {
        let planner = DnsRecordPlanner::new("example.com");

        let spec = planner.plan_mx("mx.example.com", 10);

        assert_eq!(spec.kind(), DnsRecordKind::Mx);
        assert_eq!(
            spec.payload(),
            &RecordPayload::Mx {
                mail_server: "mx.example.com".to_string(),
                priority: 10,
            }
        );
        // Succeeds for a host that cannot exist: nothing is published or resolved.
        let unpublished = planner.plan_mx("does-not-exist.invalid", 0);
        assert_eq!(unpublished.value(), "0 does-not-exist.invalid");
    }

    #[test]
    fn test_plan_spf() -> TestResult {
        let planner = DnsRecordPlanner::new("example.com");

        let spec = planner.plan_spf(&["a.com", "b.com"])?;

        assert_eq!(spec.value(), "v=spf1 a.com b.com -all");
        assert_eq!(spec.name(), "example.com");

        Ok(())
    }

    #[test]
    fn test_plan_spf_drops_blank_entries() -> TestResult {
        let planner = DnsRecordPlanner::new("example.com");

        let spec = planner.plan_spf(&[" include:spf.example.net ", "", "ip4:192.0.2.1"])?;

        assert_eq!(
            spec.value(),
            "v=spf1 include:spf.example.net ip4:192.0.2.1 -all"
        );

        Ok(())
    }

    #[test]
    fn test_plan_spf_requires_a_server() {
        let planner = DnsRecordPlanner::new("example.com");

        assert!(matches!(
            planner.plan_spf::<&str>(&[]),
            Err(DnsRecordError::EmptyServerList)
        ));
        assert!(matches!(
            planner.plan_spf(&["  "]),
            Err(DnsRecordError::EmptyServerList)
        ));
    }

    #[test]
    fn test_plan_dkim_keeps_value_verbatim() -> TestResult {
        let planner = DnsRecordPlanner::new("example.com");
        let value = format!("v=DKIM1; k=rsa; p={}", "A".repeat(400));

        let spec = planner.plan_dkim("selector1", &value)?;

        assert_eq!(spec.value(), value);
        assert_eq!(
            spec.payload(),
            &RecordPayload::Dkim {
                selector: "selector1".to_string(),
                value,
            }
        );

        Ok(())
    }

    #[test]
    fn test_plan_dkim_requires_selector_and_value() {
        let planner = DnsRecordPlanner::new("example.com");

        assert!(matches!(
            planner.plan_dkim("", "v=DKIM1"),
            Err(DnsRecordError::EmptySelector)
        ));
        assert!(matches!(
            planner.plan_dkim("selector1", " "),
            Err(DnsRecordError::EmptyDkimValue)
        ));
    }
}
