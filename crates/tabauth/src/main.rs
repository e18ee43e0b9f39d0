//! tabauth - Basic-auth gateway for Tableau trusted tickets
//!
//! Main entry point for the `tabauth` binary.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

mod start;

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// tabauth - exchange Basic-authenticated requests for Tableau trusted tickets
#[derive(Parser, Debug)]
#[command(name = "tabauth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a TOML config file
    #[arg(long, env = "TABAUTH_CONFIG")]
    pub config: Option<String>,

    /// Address to bind to, e.g. 0.0.0.0:8443 or :8443 (overrides config)
    #[arg(long, env = "BIND_ADDR")]
    pub bind: Option<String>,

    /// Trusted-auth base URL; /trusted is appended (overrides config)
    #[arg(long, env = "TABLEAU_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Account table JSON file (overrides config)
    #[arg(long, env = "TABAUTH_ACCOUNTS")]
    pub accounts: Option<String>,

    /// Disable per-request logging
    #[arg(long)]
    pub no_request_logging: bool,

    /// Directory for daily rolling JSON logs (overrides config)
    #[arg(long, env = "TABAUTH_LOG_DIR")]
    pub log_dir: Option<String>,

    /// PEM certificate chain; serve HTTPS together with --tls-key
    #[arg(long, env = "TABAUTH_TLS_CERT")]
    pub tls_cert: Option<String>,

    /// PEM private key for --tls-cert
    #[arg(long, env = "TABAUTH_TLS_KEY")]
    pub tls_key: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = start::Overrides::from_cli(&cli);

    let file = start::load_file(overrides.config.as_deref())?;
    let settings = start::resolve(file, &overrides)?;

    let _guard = init_tracing(cli.verbose, settings.log_dir.clone());

    start::run(settings).await
}

/// Console (human-readable) logging plus an optional rotating JSON file.
///
/// The returned guard flushes the file writer on drop and must outlive the
/// server.
fn init_tracing(verbose: bool, log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    let default_filter = if verbose {
        "tabauth=debug,tabauth_server=debug,tabauth_trusted=debug,tabauth_config=debug,info"
    } else {
        "tabauth=info,tabauth_server=info,tabauth_trusted=info,warn"
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "tabauth.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(filter()),
        )
        .with(file_layer)
        .init();

    guard
}
