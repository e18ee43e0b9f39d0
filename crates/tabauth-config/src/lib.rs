//! Configuration for the tabauth gateway.
//!
//! Provides:
//! - TOML settings file (`[server]`, `[trusted]`, `[accounts]`, `[logging]`)
//! - The account table: a read-only `username → password` map loaded from JSON
//!
//! Command-line and environment overrides are layered on top by the binary.

pub mod accounts;
pub mod error;
pub mod settings;

pub use accounts::{AccountStore, load_accounts};
pub use error::{ConfigError, Result};
pub use settings::{
    AccountsSection, DEFAULT_ACCOUNTS_PATH, DEFAULT_BIND, DEFAULT_ENDPOINT, LoggingSection,
    ServerSection, TabauthConfig, TrustedSection, load_config_file,
};
