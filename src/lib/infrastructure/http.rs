//! HTTP Server

use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::async_trait;
use axum_server::Handle;
use clap::Parser;
use tokio::{signal, task::JoinError};
use tracing::{debug, error, info};

mod errors;
mod open_api;

pub mod handlers;
pub mod servers;
pub mod state;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
pub struct HttpServerConfig {
    /// The port the HTTP redirect server listens on
    #[arg(long, env = "HTTP_PORT", default_value = "3000")]
    pub http_port: u16,

    /// The port the HTTPS API server listens on
    #[arg(long, env = "HTTPS_PORT", default_value = "3443")]
    pub https_port: u16,

    /// The public HTTPS URL, HTTP requests are redirected here
    #[arg(long, env = "BASE_URL")]
    pub base_url: String,

    /// PEM certificate chain
    #[arg(long, env = "TLS_CERT_PATH")]
    pub cert_path: String,

    /// PEM private key
    #[arg(long, env = "TLS_KEY_PATH")]
    pub key_path: String,
}

/// A server that runs until shut down
#[async_trait]
pub trait Server {
    /// Serve requests until a shutdown signal arrives
    async fn run(self) -> Result<()>;
}

/// Log how a spawned server finished, passing any failure on
pub fn report_exit(listener: &str, result: Result<Result<()>, JoinError>) -> Result<()> {
    match result {
        Ok(Ok(())) => {
            info!("{listener} server stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("{listener} server failed: {e:#}");
            Err(e.context(format!("{listener} server failed")))
        }
        Err(e) => {
            error!("{listener} server task did not finish: {e}");
            Err(anyhow!("{listener} server task did not finish: {e}"))
        }
    }
}

#[mutants::skip]
pub(crate) async fn shutdown_signal(handle: Option<Handle>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    if let Some(handle) = handle {
        debug!("shutting down gracefully");
        handle.graceful_shutdown(Some(Duration::from_secs(10)));
    }
}
