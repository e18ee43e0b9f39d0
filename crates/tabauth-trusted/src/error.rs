//! Error types for the trusted-auth client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, TrustedError>;

/// Errors that can occur while requesting a ticket.
#[derive(Debug, thiserror::Error)]
pub enum TrustedError {
    /// Connection, request, or body-read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured base URL is not a usable URL.
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL parsed but cannot serve as an HTTP endpoint.
    #[error("unsupported base URL '{0}': expected http or https")]
    UnsupportedScheme(String),
}
