//! Error types for the server.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tabauth_trusted::TrustedError;
use thiserror::Error;

use crate::config::BASIC_REALM;
use crate::path::BadPath;
use crate::routes::ticket::BadQuery;

/// Per-request failure in the ticket pipeline.
///
/// Every variant is terminal for its request. Responses carry only the
/// standard status phrase; detail goes to the log.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing, malformed, or rejected Basic credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Request path is not `/user/{subject}/ticket`.
    #[error(transparent)]
    BadPath(#[from] BadPath),

    /// Query string cannot be decoded.
    #[error(transparent)]
    BadQuery(#[from] BadQuery),

    /// The trusted-auth call failed at the transport level (connect, send or body read).
    #[error("trusted ticket request failed: {0}")]
    Transport(#[from] TrustedError),

    /// The trusted-auth service answered with the "no ticket" sentinel.
    #[error("no ticket issued for '{subject}'")]
    TicketNotFound { subject: String },
}

impl GatewayError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::BadPath(_) | GatewayError::BadQuery(_) => StatusCode::BAD_REQUEST,
            GatewayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::TicketNotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            GatewayError::Transport(e) => {
                tracing::error!(status = %status.as_u16(), error = %e, "Ticket exchange failed");
            }
            GatewayError::TicketNotFound { subject } => {
                tracing::info!(status = %status.as_u16(), subject = %subject, "No ticket issued");
            }
            GatewayError::BadPath(e) => {
                tracing::warn!(status = %status.as_u16(), path = %e.path, "Bad request path");
            }
            GatewayError::BadQuery(_) => {
                tracing::warn!(status = %status.as_u16(), "Undecodable query string");
            }
            GatewayError::Unauthorized => {
                tracing::debug!(status = %status.as_u16(), "Rejected credentials");
            }
        }

        let mut response = status_text_response(status);
        if status == StatusCode::UNAUTHORIZED {
            let challenge = format!("Basic realm=\"{}\"", BASIC_REALM);
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

/// Plain-text response whose body is the canonical status phrase and a newline.
pub fn status_text_response(status: StatusCode) -> Response {
    let body = format!("{}\n", status.canonical_reason().unwrap_or_default());
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        body,
    )
        .into_response()
}

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listener.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The certificate or key could not be loaded.
    #[error("TLS setup failed for '{}': {}", path.display(), reason)]
    Tls { path: PathBuf, reason: String },

    /// The listener failed while serving.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
