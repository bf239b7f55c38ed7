//! hickory-resolver lookups

use std::fmt;

use async_trait::async_trait;
use hickory_resolver::{
    config::ResolverOpts, name_server::TokioConnectionProvider, ResolveError, TokioResolver,
};
use tracing::debug;

use crate::domain::dns::{DnsLookup, MxRecord, ResolverFailure};

use super::DnsConfig;

/// Resolves against a public resolver. Answers are not cached.
#[derive(Clone)]
pub struct HickoryLookup {
    resolver: TokioResolver,
}

impl fmt::Debug for HickoryLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HickoryLookup").finish_non_exhaustive()
    }
}

impl HickoryLookup {
    /// Build a resolver from configuration
    pub fn new(config: &DnsConfig) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = config.timeout();
        opts.cache_size = 0;

        let resolver = TokioResolver::builder_with_config(
            config.resolver.config(),
            TokioConnectionProvider::default(),
        )
        .with_options(opts)
        .build();

        Self { resolver }
    }
}

/// An empty answer is not a failure
fn empty_or_failure<T>(err: ResolveError) -> Result<Vec<T>, ResolverFailure> {
    if err.is_no_records_found() {
        Ok(vec![])
    } else {
        Err(ResolverFailure(err.to_string()))
    }
}

#[async_trait]
impl DnsLookup for HickoryLookup {
    #[mutants::skip]
    async fn mx_lookup(&self, domain: &str) -> Result<Vec<MxRecord>, ResolverFailure> {
        debug!("MX lookup for {domain}");

        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|mx| MxRecord::new(mx.preference(), &mx.exchange().to_utf8()))
                .collect()),
            Err(err) => empty_or_failure(err),
        }
    }

    #[mutants::skip]
    async fn txt_lookup(&self, domain: &str) -> Result<Vec<String>, ResolverFailure> {
        debug!("TXT lookup for {domain}");

        match self.resolver.txt_lookup(domain).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|part| String::from_utf8_lossy(part))
                        .collect::<String>()
                })
                .collect()),
            Err(err) => empty_or_failure(err),
        }
    }
}
