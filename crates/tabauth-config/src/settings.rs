//! TOML settings file.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8443"
//! request_logging = true
//! tls_cert = "/etc/tabauth/cert.pem"
//! tls_key = "/etc/tabauth/key.pem"
//!
//! [trusted]
//! endpoint = "https://tableau.internal"
//!
//! [accounts]
//! path = "/etc/tabauth/accounts.json"
//!
//! [logging]
//! dir = "/var/log/tabauth"
//! ```
//!
//! Every section and key is optional; missing values fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Default trusted-auth service base URL.
pub const DEFAULT_ENDPOINT: &str = "http://localhost";

/// Default account table location, relative to the working directory.
pub const DEFAULT_ACCOUNTS_PATH: &str = "accounts.json";

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabauthConfig {
    pub server: ServerSection,
    pub trusted: TrustedSection,
    pub accounts: AccountsSection,
    pub logging: LoggingSection,
}

impl TabauthConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.trusted.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "trusted.endpoint".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.server.tls_cert.is_some() != self.server.tls_key.is_some() {
            return Err(ConfigError::InvalidValue {
                field: "server.tls_cert/server.tls_key".to_string(),
                reason: "must be set together".to_string(),
            });
        }
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.bind".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from a TOML file.
pub fn load_config_file(path: &Path) -> Result<TabauthConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    TabauthConfig::from_toml(&contents)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to (`host:port`).
    pub bind: String,
    /// Log one line per completed request.
    pub request_logging: bool,
    /// PEM certificate chain; HTTPS when set together with `tls_key`.
    pub tls_cert: Option<PathBuf>,
    /// PEM private key.
    pub tls_key: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            request_logging: true,
            tls_cert: None,
            tls_key: None,
        }
    }
}

/// Trusted-auth service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustedSection {
    /// Base URL; `/trusted` is appended per request.
    pub endpoint: String,
}

impl Default for TrustedSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Account table location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsSection {
    pub path: PathBuf,
}

impl Default for AccountsSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ACCOUNTS_PATH),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Directory for daily-rotated JSON logs. Console only when unset.
    pub dir: Option<PathBuf>,
}
