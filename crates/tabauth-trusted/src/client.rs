//! HTTP client for the `/trusted` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::{Result, TrustedError};
use crate::ticket::{Ticket, TicketRequest};

/// Path appended to the base URL for ticket requests.
pub const TRUSTED_PATH: &str = "/trusted";

// ============================================================================
// TicketSource Trait
// ============================================================================

/// Something that can mint trusted-auth tickets.
#[async_trait]
pub trait TicketSource: Send + Sync + std::fmt::Debug {
    /// Request one ticket. Implementations make exactly one attempt.
    async fn request_ticket(&self, request: &TicketRequest) -> Result<Ticket>;
}

/// Shared ticket source handle.
pub type SharedTicketSource = Arc<dyn TicketSource>;

// ============================================================================
// TrustedClient
// ============================================================================

/// Ticket source backed by a Tableau Server `/trusted` endpoint.
#[derive(Debug, Clone)]
pub struct TrustedClient {
    http: reqwest::Client,
    trusted_url: String,
}

impl TrustedClient {
    /// Create a client for the server at `base_url` (e.g. `https://tableau.internal`).
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("tabauth/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(base_url, http)
    }

    /// Create a client using a preconfigured HTTP client.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let parsed = Url::parse(base)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TrustedError::UnsupportedScheme(base.to_string()));
        }

        Ok(Self {
            http,
            trusted_url: format!("{}{}", base, TRUSTED_PATH),
        })
    }

    /// Full URL that ticket requests are POSTed to.
    pub fn trusted_url(&self) -> &str {
        &self.trusted_url
    }
}

#[async_trait]
impl TicketSource for TrustedClient {
    async fn request_ticket(&self, request: &TicketRequest) -> Result<Ticket> {
        let response = self
            .http
            .post(&self.trusted_url)
            .form(&request.form_fields())
            .send()
            .await?;

        // The status is not interpreted here; Tableau reports failures in the body.
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(
            username = %request.username(),
            status = %status.as_u16(),
            bytes = body.len(),
            "Trusted ticket response received"
        );

        Ok(Ticket::new(body))
    }
}
