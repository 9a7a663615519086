//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Relative TLS paths are resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = read(path)?;
    let mut config: ServerConfig = toml::from_str(&content)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    load_tls_material(&mut config, base)?;

    finalize(config)
}

/// Validate an in-memory configuration (TLS bytes already set).
pub fn finalize(config: ServerConfig) -> Result<ServerConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn load_tls_material(config: &mut ServerConfig, base: &Path) -> Result<(), ConfigError> {
    if let Some(key_path) = &config.https.key_path {
        config.https.key = read_bytes(&base.join(key_path))?;
    }
    if let Some(cert_path) = &config.https.cert_path {
        config.https.cert = read_bytes(&base.join(cert_path))?;
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/shared-edge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn finalize_surfaces_validation_errors() {
        let mut config = ServerConfig::default();
        config.local_port = 0;
        let err = finalize(config).unwrap_err();
        assert!(err.to_string().contains("local_port"));
    }
}
