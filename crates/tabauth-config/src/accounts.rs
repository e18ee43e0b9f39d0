//! Account table for caller authentication.
//!
//! The table maps usernames to passwords and is read from a JSON object:
//!
//! ```json
//! { "reporting": "s3cret", "portal": "hunter2" }
//! ```
//!
//! It is loaded once at startup and never mutated afterwards, so it can be
//! shared across request tasks behind an `Arc` without locking.
//!
//! # Security
//!
//! Passwords are held in plaintext, both on disk and in memory. Comparison is
//! exact and case-sensitive, performed in constant time.

use std::collections::HashMap;
use std::path::Path;

use subtle::ConstantTimeEq;

use crate::error::{ConfigError, Result};

/// Read-only `username → password` table.
#[derive(Clone, Default)]
pub struct AccountStore {
    accounts: HashMap<String, String>,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("accounts", &self.accounts.len())
            .finish()
    }
}

impl AccountStore {
    /// Build a store from an already-parsed mapping.
    pub fn new(accounts: HashMap<String, String>) -> Self {
        Self { accounts }
    }

    /// Parse a JSON object of `username: password` pairs.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let accounts: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::new(accounts))
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the table has no accounts (every request will be rejected).
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Get the stored password for a username.
    pub fn lookup(&self, username: &str) -> Option<&str> {
        self.accounts.get(username).map(String::as_str)
    }

    /// Check a username/password pair.
    ///
    /// Returns `false` for unknown usernames regardless of the supplied
    /// password, including the empty string.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.lookup(username) {
            Some(expected) => constant_time_eq(password, expected),
            None => {
                // Same comparison cost as a known user.
                let _ = constant_time_eq(password, password);
                false
            }
        }
    }
}

impl FromIterator<(String, String)> for AccountStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Load the account table from a JSON file.
pub fn load_accounts(path: &Path) -> Result<AccountStore> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;

    let store = AccountStore::from_json(&contents).map_err(|e| ConfigError::ParseAccounts {
        path: path.display().to_string(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), accounts = store.len(), "Loaded account table");
    Ok(store)
}

/// Compare two strings in constant time.
///
/// Lengths are not hidden: a length mismatch returns early after a dummy
/// comparison of the same cost class.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() == b_bytes.len() {
        a_bytes.ct_eq(b_bytes).into()
    } else {
        let _ = a_bytes.ct_eq(a_bytes);
        false
    }
}
