//! Application state shared across handlers.

use std::sync::Arc;

use tabauth_config::AccountStore;
use tabauth_trusted::SharedTicketSource;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// Everything here is read-only once the server starts.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Caller accounts for Basic authentication.
    pub accounts: Arc<AccountStore>,

    /// Where tickets come from.
    pub tickets: SharedTicketSource,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: ServerConfig, accounts: AccountStore, tickets: SharedTicketSource) -> Self {
        Self {
            config: Arc::new(config),
            accounts: Arc::new(accounts),
            tickets,
        }
    }
}
