//! Startup: layer settings, load accounts, run the gateway.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tabauth_config::{TabauthConfig, load_accounts, load_config_file};
use tabauth_server::{Server, ServerConfig, TlsConfig};
use tabauth_trusted::TrustedClient;
use tracing::{info, warn};

use crate::Cli;

/// Values supplied on the command line or through the environment.
///
/// Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub bind: Option<String>,
    pub endpoint: Option<String>,
    pub accounts: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub no_request_logging: bool,
}

impl Overrides {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config: non_empty(&cli.config).map(PathBuf::from),
            bind: non_empty(&cli.bind),
            endpoint: non_empty(&cli.endpoint),
            accounts: non_empty(&cli.accounts).map(PathBuf::from),
            log_dir: non_empty(&cli.log_dir).map(PathBuf::from),
            tls_cert: non_empty(&cli.tls_cert).map(PathBuf::from),
            tls_key: non_empty(&cli.tls_key).map(PathBuf::from),
            no_request_logging: cli.no_request_logging,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Fully resolved startup settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind: SocketAddr,
    pub endpoint: String,
    pub accounts: PathBuf,
    pub request_logging: bool,
    pub log_dir: Option<PathBuf>,
    pub tls: Option<TlsConfig>,
}

/// Load the config file if one was named, otherwise start from defaults.
pub fn load_file(path: Option<&Path>) -> Result<TabauthConfig> {
    match path {
        Some(path) => load_config_file(path)
            .with_context(|| format!("loading config file {}", path.display())),
        None => Ok(TabauthConfig::default()),
    }
}

/// Apply overrides on top of file settings.
pub fn resolve(file: TabauthConfig, overrides: &Overrides) -> Result<Settings> {
    let bind = overrides.bind.as_deref().unwrap_or(&file.server.bind);
    let endpoint = overrides
        .endpoint
        .clone()
        .unwrap_or(file.trusted.endpoint);

    // Cert and key are layered independently, then must pair up.
    let tls = match (
        overrides.tls_cert.clone().or(file.server.tls_cert),
        overrides.tls_key.clone().or(file.server.tls_key),
    ) {
        (Some(cert), Some(key)) => Some(TlsConfig::new(cert, key)),
        (None, None) => None,
        (Some(_), None) => return Err(anyhow!("TLS certificate given without a TLS key")),
        (None, Some(_)) => return Err(anyhow!("TLS key given without a TLS certificate")),
    };

    Ok(Settings {
        bind: parse_bind_address(bind)?,
        endpoint: endpoint.trim_end_matches('/').to_string(),
        accounts: overrides.accounts.clone().unwrap_or(file.accounts.path),
        request_logging: file.server.request_logging && !overrides.no_request_logging,
        log_dir: overrides.log_dir.clone().or(file.logging.dir),
        tls,
    })
}

/// Parse a bind address.
///
/// Accepts `ip:port`, `host:port` (resolved once at startup), and the
/// `:port` shorthand for all interfaces.
pub fn parse_bind_address(bind: &str) -> Result<SocketAddr> {
    let bind = bind.trim();
    let expanded;
    let bind = if bind.starts_with(':') {
        expanded = format!("0.0.0.0{}", bind);
        expanded.as_str()
    } else {
        bind
    };

    if let Ok(addr) = bind.parse::<SocketAddr>() {
        return Ok(addr);
    }

    bind.to_socket_addrs()
        .with_context(|| format!("invalid bind address '{}'", bind))?
        .next()
        .ok_or_else(|| anyhow!("bind address '{}' did not resolve", bind))
}

/// Start the gateway and serve until Ctrl-C or SIGTERM.
pub async fn run(settings: Settings) -> Result<()> {
    let accounts = load_accounts(&settings.accounts)
        .with_context(|| format!("loading accounts from {}", settings.accounts.display()))?;
    if accounts.is_empty() {
        warn!(
            path = %settings.accounts.display(),
            "Account table is empty; every request will be rejected"
        );
    }
    info!(
        accounts = accounts.len(),
        path = %settings.accounts.display(),
        "Loaded caller accounts"
    );
    warn!("Account passwords are stored in plaintext; restrict access to the account file");

    let tickets = Arc::new(
        TrustedClient::new(&settings.endpoint)
            .with_context(|| format!("invalid trusted endpoint '{}'", settings.endpoint))?,
    );
    info!(url = %tickets.trusted_url(), "Trusted-auth endpoint configured");

    let mut config =
        ServerConfig::new(settings.bind).with_request_logging(settings.request_logging);
    match settings.tls {
        Some(tls) => {
            info!(cert = %tls.cert_path.display(), key = %tls.key_path.display(), "Serving HTTPS");
            config = config.with_tls(tls);
        }
        None => warn!("No TLS certificate configured; serving plain HTTP"),
    }
    let server = Server::new(config, accounts, tickets);

    server.run_with_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
