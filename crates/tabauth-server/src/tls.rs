//! HTTPS listener configuration.

use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;
use crate::error::{Result, ServerError};

/// Load the PEM certificate chain and key into a rustls server config.
///
/// Uses the `ring` provider explicitly so no process-wide default provider
/// has to be installed.
pub fn load_rustls_config(tls: &TlsConfig) -> Result<RustlsConfig> {
    let certs = CertificateDer::pem_file_iter(&tls.cert_path)
        .and_then(|certs| certs.collect::<std::result::Result<Vec<_>, _>>())
        .map_err(|e| tls_error(&tls.cert_path, e))?;
    if certs.is_empty() {
        return Err(tls_error(&tls.cert_path, "no certificates found"));
    }

    let key = PrivateKeyDer::from_pem_file(&tls.key_path).map_err(|e| tls_error(&tls.key_path, e))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .and_then(|builder| builder.with_no_client_auth().with_single_cert(certs, key))
        .map_err(|e| tls_error(&tls.cert_path, e))?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

fn tls_error(path: &Path, reason: impl std::fmt::Display) -> ServerError {
    ServerError::Tls {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
