//! TLS configuration from in-memory PEM material.

use axum_server::tls_rustls::RustlsConfig;

/// Build a rustls server configuration from PEM-encoded certificate and key.
pub async fn load_tls_config(cert: &[u8], key: &[u8]) -> Result<RustlsConfig, std::io::Error> {
    if cert.is_empty() || key.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "TLS certificate and key must both be present",
        ));
    }

    RustlsConfig::from_pem(cert.to_vec(), key.to_vec()).await
}
