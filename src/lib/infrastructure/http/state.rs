//! Application state module

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::domain::{communication::email_messages::EmailService, dns::DnsService};

/// Global application state
#[derive(Clone)]
pub struct AppState<E: EmailService, D: DnsService> {
    /// The time the server started
    pub start_time: DateTime<Utc>,

    /// Email dispatch and history
    pub emails: Arc<E>,

    /// DNS record planning and verification
    pub dns: Arc<D>,
}

/// Implementation of the application state
impl<E, D> AppState<E, D>
where
    E: EmailService,
    D: DnsService,
{
    /// Create a new application state
    pub fn new(emails: E, dns: D) -> Self {
        Self {
            start_time: Utc::now(),
            emails: Arc::new(emails),
            dns: Arc::new(dns),
        }
    }
}

impl<E, D> fmt::Debug for AppState<E, D>
where
    E: EmailService,
    D: DnsService,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("start_time", &self.start_time)
            .field("emails", &"EmailService")
            .field("dns", &"DnsService")
            .finish()
    }
}

#[cfg(test)]
use crate::domain::{
    communication::email_messages::tests::MockEmailService, dns::tests::MockDnsService,
};

#[cfg(test)]
pub fn test_state(
    emails: Option<MockEmailService>,
    dns: Option<MockDnsService>,
) -> AppState<MockEmailService, MockDnsService> {
    AppState::new(
        emails.unwrap_or_else(MockEmailService::new),
        dns.unwrap_or_else(MockDnsService::new),
    )
}
