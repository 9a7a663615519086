//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a shared edge instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Production mode selects the public ports (80/443) and enables HTTPS
    /// when TLS material is present.
    pub is_production: bool,

    /// Plain HTTP port used outside production.
    pub local_port: u16,

    /// URL prefix of the loopback-only coordination endpoints.
    pub internal_path: String,

    /// TLS material for the HTTPS listener.
    pub https: HttpsConfig,

    /// Per-IP rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Startup role probe.
    pub probe: ProbeConfig,

    /// Module linking and forwarding.
    pub link: LinkConfig,

    /// Listener and middleware chain.
    pub transport: TransportConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            is_production: false,
            local_port: 8080,
            internal_path: "/internal".to_string(),
            https: HttpsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            probe: ProbeConfig::default(),
            link: LinkConfig::default(),
            transport: TransportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// TLS material.
///
/// Config files name PEM files; the loader reads them into `key`/`cert`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpsConfig {
    /// Path to the private key file (PEM).
    pub key_path: Option<PathBuf>,

    /// Path to the certificate chain file (PEM).
    pub cert_path: Option<PathBuf>,

    #[serde(skip)]
    pub key: Vec<u8>,

    #[serde(skip)]
    pub cert: Vec<u8>,
}

impl HttpsConfig {
    /// Both key and certificate are present.
    pub fn has_material(&self) -> bool {
        !self.key.is_empty() && !self.cert.is_empty()
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Install the limiter in front of every route.
    pub enabled: bool,

    /// Requests admitted per window before blocking begins (plus one).
    pub max_requests: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Interval between stale-window sweeps in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 5,
            window_ms: 5000,
            sweep_interval_secs: 30,
        }
    }
}

/// Role probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Deadline for the single health-check attempt in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

/// Linking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Deadline for a forwarded link request in milliseconds.
    pub forward_timeout_ms: u64,

    /// Extra attempts when the owner cannot be connected to.
    pub forward_retries: u32,

    /// Base delay for the retry backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for the retry backoff in milliseconds.
    pub retry_max_delay_ms: u64,

    /// Last-resort directory module paths are resolved against.
    /// Defaults to the directory of the running executable.
    pub base_dir: Option<PathBuf>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            forward_timeout_ms: 5000,
            forward_retries: 1,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 1000,
            base_dir: None,
        }
    }
}

/// Listener and middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Host the listener binds to.
    pub bind_host: String,

    /// Parse JSON bodies.
    pub json: bool,

    /// Only accept objects and arrays as JSON bodies.
    pub json_strict: bool,

    /// Parse the `Cookie` header.
    pub cookies: bool,

    /// Add security response headers.
    pub security_headers: bool,

    /// Directory served for unmatched paths.
    pub static_root: Option<PathBuf>,

    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            json: true,
            json_strict: false,
            cookies: true,
            security_headers: true,
            static_root: None,
            max_body_size: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the pretty format.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert!(!config.is_production);
        assert_eq!(config.local_port, 8080);
        assert_eq!(config.internal_path, "/internal");
        assert!(!config.https.has_material());
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_ms, 5000);
        assert_eq!(config.rate_limit.sweep_interval_secs, 30);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            local_port = 9000

            [rate_limit]
            max_requests = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.local_port, 9000);
        assert_eq!(config.rate_limit.max_requests, 2);
        assert_eq!(config.rate_limit.window_ms, 5000);
        assert_eq!(config.internal_path, "/internal");
    }
}
