//! Plain HTTP listener that redirects everything to HTTPS

use std::net::{SocketAddr, TcpListener};

use anyhow::{Context, Result};
use axum::{async_trait, extract::State, http::Uri, response::Redirect, Router};
use axum_server::Handle;
use tracing::{debug, info};

use crate::infrastructure::http::{shutdown_signal, Server};

/// The application's HTTP server
#[derive(Debug)]
pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    /// Returns a new HTTP server bound to `address`, redirecting to `base_url`.
    pub async fn new(address: SocketAddr, base_url: &str) -> Result<Self> {
        let router = router(base_url.trim_end_matches('/').to_string());

        let listener = TcpListener::bind(address)
            .with_context(|| format!("failed to listen on {address}"))?;
        listener
            .set_nonblocking(true)
            .context("failed to make listener non-blocking")?;

        Ok(Self { router, listener })
    }
}

#[async_trait]
impl Server for HttpServer {
    /// Runs the HTTP server.
    #[mutants::skip]
    async fn run(self) -> Result<()> {
        debug!(
            "HTTP Server listening on {}",
            self.listener
                .local_addr()
                .context("failed to get local address")?
        );

        let handle = Handle::new();

        let server = axum_server::from_tcp(self.listener)
            .handle(handle.clone())
            .serve(self.router.into_make_service());

        tokio::select! {
            result = server => result.context("server error")?,
            _ = shutdown_signal(Some(handle)) => {
                info!("Shutting down HTTP server");
            }
        }

        Ok(())
    }
}

async fn redirect_handler(State(base_url): State<String>, uri: Uri) -> Redirect {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!("{base_url}{path_and_query}");

    debug!("redirecting to HTTPS: {target}");

    Redirect::temporary(&target)
}

/// Create the router for the HTTP server
pub fn router(base_url: String) -> Router {
    Router::new()
        .fallback(redirect_handler)
        .with_state(base_url)
}
