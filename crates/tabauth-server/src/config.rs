//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default port when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Realm advertised in `WWW-Authenticate` challenges.
pub const BASIC_REALM: &str = "tabauth";

/// PEM certificate chain and private key for serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl TlsConfig {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Enable per-request logging.
    pub request_logging: bool,

    /// Serve HTTPS with these files; plain HTTP when `None`.
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            request_logging: true,
            tls: None,
        }
    }
}

impl ServerConfig {
    /// Create a configuration bound to `bind_address`.
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Serve HTTPS.
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }
}
