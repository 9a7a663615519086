//! Compiled catalog of module entry points.
//!
//! A module on disk is a small TOML manifest naming its entry point:
//!
//! ```toml
//! entry = "status"
//! description = "Version and role report"
//! ```
//!
//! Entry points are plain Rust functions registered in a [`ModuleCatalog`]
//! by the binary embedding the edge. Loading a manifest whose entry is not in
//! the catalog fails the same way as a manifest that cannot be read or
//! parsed: the module has no usable entry point.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::link::error::{LinkError, MountError};
use crate::link::host::ModuleHost;

/// A module's entry point. Called once, with the host, when the module is
/// linked on the owning process.
pub type LinkFn = Arc<dyn Fn(&ModuleHost) -> Result<(), MountError> + Send + Sync>;

/// On-disk module descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    pub entry: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A manifest resolved to its entry point.
#[derive(Clone)]
pub struct LoadedModule {
    pub manifest: ModuleManifest,
    pub entry: LinkFn,
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct ModuleCatalog {
    entries: HashMap<String, LinkFn>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry point under `name`, replacing any previous one.
    pub fn register<F>(mut self, name: impl Into<String>, entry: F) -> Self
    where
        F: Fn(&ModuleHost) -> Result<(), MountError> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(entry));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered entry names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Read the manifest at `path` and look up its entry point.
    pub async fn load(&self, path: &Path) -> Result<LoadedModule, LinkError> {
        let invalid = |reason: String| LinkError::InvalidExport {
            path: path.to_path_buf(),
            reason,
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| invalid(format!("unreadable manifest: {e}")))?;
        let manifest: ModuleManifest =
            toml::from_str(&content).map_err(|e| invalid(format!("malformed manifest: {e}")))?;

        let entry = self
            .entries
            .get(&manifest.entry)
            .cloned()
            .ok_or_else(|| invalid(format!("unknown entry point {:?}", manifest.entry)))?;

        Ok(LoadedModule { manifest, entry })
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("entries", &self.names())
            .finish()
    }
}
