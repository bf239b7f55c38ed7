#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! REST API for sending email and managing mail-domain DNS records

use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
};

use anyhow::{anyhow, Result};
use clap::Parser;
use mail_dispatch::{
    domain::{
        communication::{email_messages::EmailServiceImpl, mailer::TransportSelector},
        dns::{DnsRecordPlanner, DnsServiceImpl, DnsVerifier},
    },
    infrastructure::{
        db::postgres::{DatabaseConnectionDetails, PostgresDatabase},
        dns::{DnsConfig, HickoryLookup},
        email::{
            provider::{ApiMailer, ProviderConfig},
            smtp::{SMTPConfig, SMTPMailer},
        },
        http::{
            servers::{http::HttpServer, https::HttpsServer},
            state::AppState,
            report_exit, HttpServerConfig, Server,
        },
    },
};
use tracing::{error, info};

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The HTTP server configuration
    #[clap(flatten)]
    pub server: HttpServerConfig,

    /// The database connection details
    #[clap(flatten)]
    pub db: DatabaseConnectionDetails,

    /// The SMTP relay
    #[clap(flatten)]
    pub smtp: SMTPConfig,

    /// The email provider API
    #[clap(flatten)]
    pub provider: ProviderConfig,

    /// The mail domain and resolver
    #[clap(flatten)]
    pub dns: DnsConfig,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Failed to load environment: {}", e);
    }

    tracing_subscriber::fmt::init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install the rustls crypto provider"))?;

    let args = Args::parse();

    let api_mailer = ApiMailer::new(&args.provider).map_err(|e| {
        error!("email provider is misconfigured: {e}");
        e
    })?;

    let postgres = Arc::new(PostgresDatabase::new(&args.db).await?);
    postgres.migrate().await?;

    let emails = EmailServiceImpl::new(
        Arc::clone(&postgres),
        TransportSelector::new(Arc::new(SMTPMailer::new(args.smtp)), Arc::new(api_mailer)),
    );

    let dns = DnsServiceImpl::new(
        postgres,
        DnsRecordPlanner::new(&args.dns.domain),
        DnsVerifier::new(Arc::new(HickoryLookup::new(&args.dns))),
    );

    info!("managing mail domain {}", args.dns.domain);

    let state = AppState::new(emails, dns);

    let http_port = args.server.http_port;
    let https_port = args.server.https_port;

    let (http_v4, http_v6, https_v4, https_v6) = tokio::join!(
        tokio::spawn(
            HttpServer::new(
                SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), http_port),
                &args.server.base_url,
            )
            .await?
            .run()
        ),
        tokio::spawn(
            HttpServer::new(
                SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), http_port),
                &args.server.base_url,
            )
            .await?
            .run()
        ),
        tokio::spawn(
            HttpsServer::new(
                SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), https_port),
                &args.server.cert_path,
                &args.server.key_path,
                state.clone(),
            )
            .await?
            .run()
        ),
        tokio::spawn(
            HttpsServer::new(
                SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), https_port),
                &args.server.cert_path,
                &args.server.key_path,
                state,
            )
            .await?
            .run()
        ),
    );

    let results = [
        report_exit("HTTP (IPv4)", http_v4),
        report_exit("HTTP (IPv6)", http_v6),
        report_exit("HTTPS (IPv4)", https_v4),
        report_exit("HTTPS (IPv6)", https_v6),
    ];

    results.into_iter().collect::<Result<Vec<()>>>()?;

    Ok(())
}
