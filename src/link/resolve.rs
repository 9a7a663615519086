//! Module path resolution.
//!
//! A module source is looked up, in order, as given, against the current
//! working directory, and against the edge's base directory. The first
//! candidate that exists wins.

use std::path::{Component, Path, PathBuf};

use crate::config::LinkConfig;
use crate::link::error::LinkError;

#[derive(Debug, Clone)]
pub struct Resolver {
    base_dir: PathBuf,
}

impl Resolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Base directory from config, else the running executable's directory.
    pub fn from_config(config: &LinkConfig) -> Self {
        let base_dir = config
            .base_dir
            .clone()
            .or_else(executable_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute, normalized candidates in lookup order, without duplicates.
    pub fn candidates(&self, source: &str) -> Vec<PathBuf> {
        let literal = PathBuf::from(source);
        let from_cwd = std::env::current_dir()
            .map(|cwd| cwd.join(source))
            .unwrap_or_else(|_| literal.clone());
        let from_base = self.base_dir.join(source);

        let mut candidates: Vec<PathBuf> = Vec::with_capacity(3);
        for candidate in [literal, from_cwd, from_base] {
            let absolute = std::path::absolute(&candidate).unwrap_or(candidate);
            let normalized = normalize(&absolute);
            if !candidates.contains(&normalized) {
                candidates.push(normalized);
            }
        }
        candidates
    }

    /// First existing candidate for `source`.
    pub async fn resolve(&self, source: &str) -> Result<PathBuf, LinkError> {
        for candidate in self.candidates(source) {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                tracing::debug!(source, resolved = %candidate.display(), "Module path resolved");
                return Ok(candidate);
            }
        }
        Err(LinkError::NotFound {
            path: source.to_string(),
        })
    }
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Lexically remove `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    #[test]
    fn normalize_strips_dot_segments() {
        assert_eq!(
            normalize(Path::new("/srv/modules/./chat/../status.toml")),
            PathBuf::from("/srv/modules/status.toml")
        );
    }

    #[test]
    fn absolute_source_yields_single_candidate() {
        let resolver = Resolver::new("/opt/edge");
        assert_eq!(
            resolver.candidates("/srv/status.toml"),
            vec![PathBuf::from("/srv/status.toml")]
        );
    }

    #[test]
    fn relative_source_ends_with_base_dir_candidate() {
        let resolver = Resolver::new("/opt/edge");
        let candidates = resolver.candidates("mods/status.toml");
        assert_eq!(
            candidates.last().unwrap(),
            &PathBuf::from("/opt/edge/mods/status.toml")
        );
        assert!(candidates.iter().all(|c| c.is_absolute()));
    }

    #[tokio::test]
    async fn falls_back_to_base_dir() {
        let resolver = Resolver::new(fixtures());
        let resolved = resolver.resolve("hello.toml").await.unwrap();
        assert_eq!(resolved, fixtures().join("hello.toml"));
    }

    #[tokio::test]
    async fn missing_module_is_not_found() {
        let resolver = Resolver::new(fixtures());
        let err = resolver.resolve("no-such-module.toml").await.unwrap_err();
        assert!(matches!(err, LinkError::NotFound { .. }));
    }
}
