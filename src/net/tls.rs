//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load a rustls config from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> std::io::Result<RustlsConfig> {
    for (what, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{what} file not found: {}", path.display()),
            ));
        }
    }
    RustlsConfig::from_pem_file(cert_path, key_path).await
}
