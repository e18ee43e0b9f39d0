//! HTTP gateway for Tableau trusted authentication.
//!
//! Callers authenticate with HTTP Basic credentials against a static account
//! table, then request a trusted ticket on behalf of a subject user:
//!
//! ```text
//! GET /user/{subject}/ticket[?site_id=..][&client_ip=..]
//! ```
//!
//! The gateway POSTs the subject to the trusted-auth service and relays the
//! ticket body verbatim. Every request, whatever its method or path, goes
//! through the same pipeline: authentication first, then path validation,
//! then exactly one downstream call.
//!
//! The listener speaks HTTPS (rustls) when a certificate and key are
//! configured, plain HTTP otherwise.
//!
//! # Example
//!
//! ```ignore
//! use tabauth_server::{Server, ServerConfig};
//! use tabauth_trusted::TrustedClient;
//!
//! let tickets = Arc::new(TrustedClient::new("https://tableau.internal")?);
//! let config = ServerConfig::new("127.0.0.1:8080".parse()?);
//!
//! let server = Server::new(config, accounts, tickets);
//! server.run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod path;
pub mod routes;
pub mod state;
pub mod tls;

#[cfg(test)]
mod test_support;

pub use auth::{BasicCredentials, Caller, auth_middleware, authenticate, parse_basic_auth};
pub use config::{BASIC_REALM, DEFAULT_PORT, ServerConfig, TlsConfig};
pub use error::{GatewayError, Result, ServerError, status_text_response};
pub use logging::request_logging_middleware;
pub use path::{BadPath, extract_subject, percent_decode};
pub use routes::{BadQuery, TicketQuery, ticket_handler};
pub use state::AppState;
pub use tls::load_rustls_config;

use std::future::Future;
use std::net::SocketAddr;

use axum::{Router, middleware};
use tabauth_config::AccountStore;
use tabauth_trusted::SharedTicketSource;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The tabauth HTTP gateway.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server from its configuration, accounts and ticket source.
    pub fn new(config: ServerConfig, accounts: AccountStore, tickets: SharedTicketSource) -> Self {
        Self {
            state: AppState::new(config, accounts, tickets),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router.
    ///
    /// There are no routes: the ticket handler is the fallback for every
    /// method and path, so unknown paths still pass authentication before
    /// they are rejected with 400.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(routes::ticket_handler)
            // Authentication (inner layer, runs right before the handler)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::auth_middleware,
            ))
            // Request logging (outer layer, sees 401s too)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            // TraceLayer for detailed HTTP tracing
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until the process is stopped.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = bind(addr).await?;
        self.serve(listener, std::future::pending()).await
    }

    /// Run the server, draining in-flight requests once `shutdown` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let listener = bind(self.state.config.bind_address).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener.
    ///
    /// Speaks HTTPS when the config carries TLS files, plain HTTP otherwise.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let router = self.router();

        match &self.state.config.tls {
            Some(tls) => {
                let rustls = tls::load_rustls_config(tls)?;
                info!(
                    addr = %local_addr,
                    cert = %tls.cert_path.display(),
                    "Starting tabauth gateway (https)"
                );

                let handle = axum_server::Handle::new();
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    shutdown.await;
                    shutdown_handle.graceful_shutdown(None);
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(router.into_make_service())
                    .await?;
            }
            None => {
                info!(addr = %local_addr, "Starting tabauth gateway (http)");
                axum::serve(listener, router)
                    .with_graceful_shutdown(shutdown)
                    .await?;
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}
