//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading settings or the account table.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a file from disk.
    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse the TOML settings file.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to parse the JSON account table.
    #[error("failed to parse account table '{path}': {source}")]
    ParseAccounts {
        path: String,
        source: serde_json::Error,
    },

    /// A setting holds a value that cannot be used.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
