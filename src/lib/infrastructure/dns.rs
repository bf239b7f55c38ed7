//! DNS resolution

use std::time::Duration;

use clap::{Parser, ValueEnum};
use hickory_resolver::config::ResolverConfig;

mod hickory;

pub use hickory::HickoryLookup;

/// Public resolver to query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PublicResolver {
    /// 8.8.8.8
    #[default]
    Google,

    /// 1.1.1.1
    Cloudflare,

    /// 9.9.9.9
    Quad9,
}

impl PublicResolver {
    /// The resolver's name server configuration
    pub fn config(&self) -> ResolverConfig {
        match self {
            Self::Google => ResolverConfig::google(),
            Self::Cloudflare => ResolverConfig::cloudflare(),
            Self::Quad9 => ResolverConfig::quad9(),
        }
    }
}

/// DNS configuration
#[derive(Clone, Debug, Parser)]
pub struct DnsConfig {
    /// The mail domain records are planned and verified for
    #[clap(long = "email-domain", env = "EMAIL_DOMAIN")]
    pub domain: String,

    /// Which public resolver verification queries go to
    #[clap(
        long = "dns-resolver",
        env = "DNS_RESOLVER",
        value_enum,
        default_value = "google"
    )]
    pub resolver: PublicResolver,

    /// Per-query timeout in seconds
    #[clap(long = "dns-timeout-secs", env = "DNS_TIMEOUT_SECS", default_value = "5")]
    pub timeout_secs: u64,
}

impl DnsConfig {
    /// Per-query timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
