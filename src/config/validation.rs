//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and TLS material.
//! Every problem is reported, not just the first.

use std::fmt;

use crate::config::schema::ServerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.internal_path.starts_with('/') {
        errors.push(ValidationError::new("internal_path", "must start with '/'"));
    }
    if config.internal_path.len() > 1 && config.internal_path.ends_with('/') {
        errors.push(ValidationError::new("internal_path", "must not end with '/'"));
    }
    if config.internal_path == "/" {
        errors.push(ValidationError::new("internal_path", "must not be the root path"));
    }
    if config.local_port == 0 {
        errors.push(ValidationError::new("local_port", "must be non-zero"));
    }

    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::new("probe.timeout_ms", "must be greater than 0"));
    }
    if config.link.forward_timeout_ms == 0 {
        errors.push(ValidationError::new("link.forward_timeout_ms", "must be greater than 0"));
    }
    if config.link.forward_retries > 1 {
        errors.push(ValidationError::new("link.forward_retries", "at most one retry is allowed"));
    }
    if config.transport.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "transport.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    let https = &config.https;
    if !https.cert.is_empty() && !contains_pem_cert(&https.cert) {
        errors.push(ValidationError::new("https.cert", "no PEM certificate found"));
    }
    if !https.key.is_empty() && !contains_pem_key(&https.key) {
        errors.push(ValidationError::new("https.key", "no PEM private key found"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn contains_pem_cert(pem: &[u8]) -> bool {
    let mut reader = pem;
    let found = rustls_pemfile::certs(&mut reader).any(|item| item.is_ok());
    found
}

fn contains_pem_key(pem: &[u8]) -> bool {
    let mut reader = pem;
    matches!(rustls_pemfile::private_key(&mut reader), Ok(Some(_)))
}
