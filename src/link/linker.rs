//! The linking protocol.
//!
//! `link_file` validates, resolves and loads a module on whichever process
//! calls it. The owning process then registers the module and runs its entry
//! point; any other process forwards the request to the owner.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use reqwest::Client;

use crate::config::ServerConfig;
use crate::health::Role;
use crate::link::catalog::{LoadedModule, ModuleCatalog};
use crate::link::error::{outcome_status, LinkError};
use crate::link::forward::{Forwarder, LinkRequest};
use crate::link::host::{ModuleHost, ModuleRoutes};
use crate::link::registry::LinkRegistry;
use crate::link::resolve::Resolver;
use crate::net::Endpoint;
use crate::observability::metrics;

/// Minimum length of a module name or path.
const MIN_ARG_LEN: usize = 2;

pub struct Linker {
    role: Role,
    resolver: Resolver,
    catalog: ModuleCatalog,
    registry: LinkRegistry,
    host: ModuleHost,
    forwarder: Forwarder,
}

impl Linker {
    pub fn new(
        role: Role,
        config: Arc<ServerConfig>,
        catalog: ModuleCatalog,
        routes: Arc<ModuleRoutes>,
        client: Client,
    ) -> Self {
        let forwarder = Forwarder::new(
            client,
            Endpoint::from_config(&config),
            config.internal_path.clone(),
            config.link.clone(),
        );
        Self {
            role,
            resolver: Resolver::from_config(&config.link),
            catalog,
            registry: LinkRegistry::new(),
            host: ModuleHost::new(routes, config, role),
            forwarder,
        }
    }

    /// Replace the path resolver.
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Modules linked on this process. Always empty for a client.
    pub fn registry(&self) -> &LinkRegistry {
        &self.registry
    }

    pub fn host(&self) -> &ModuleHost {
        &self.host
    }

    /// Link the module at `path` under `name`.
    pub async fn link_file(&self, name: &str, path: &str) -> Result<(), LinkError> {
        let outcome = self.try_link(name, path).await;
        let status = outcome_status(&outcome);
        metrics::record_link(status.as_u16());

        match &outcome {
            Ok(()) => tracing::info!(name, path, role = %self.role, status = %status, "Module linked"),
            Err(e) => tracing::warn!(name, path, role = %self.role, status = %status, error = %e, "Module link failed"),
        }
        outcome
    }

    /// Link every `(name, path)` pair concurrently.
    ///
    /// Outcomes are returned in input order; one failure does not stop or
    /// hide the others.
    pub async fn link_all<I, N, P>(&self, entries: I) -> Vec<Result<(), LinkError>>
    where
        I: IntoIterator<Item = (N, P)>,
        N: AsRef<str>,
        P: AsRef<str>,
    {
        let pending = entries
            .into_iter()
            .map(|(name, path)| async move { self.link_file(name.as_ref(), path.as_ref()).await });
        join_all(pending).await
    }

    async fn try_link(&self, name: &str, path: &str) -> Result<(), LinkError> {
        validate(name, "name")?;
        validate(path, "path")?;

        let resolved = self.resolver.resolve(path).await?;
        let module = self.catalog.load(&resolved).await?;

        match self.role {
            Role::Client => {
                let request = LinkRequest {
                    name: name.to_string(),
                    path: resolved.to_string_lossy().into_owned(),
                };
                self.forwarder.forward(&request).await
            }
            Role::Server => self.register(name, &resolved, &module),
        }
    }

    fn register(&self, name: &str, resolved: &Path, module: &LoadedModule) -> Result<(), LinkError> {
        self.registry.insert(name, resolved)?;

        // The name stays claimed whatever the entry point does.
        match panic::catch_unwind(AssertUnwindSafe(|| (module.entry)(&self.host))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(name, entry = %module.manifest.entry, error = %e, "Module failed to mount a route")
            }
            Err(_) => {
                tracing::error!(name, entry = %module.manifest.entry, "Module entry point panicked")
            }
        }
        Ok(())
    }
}

fn validate(value: &str, field: &'static str) -> Result<(), LinkError> {
    if value.chars().count() < MIN_ARG_LEN {
        return Err(LinkError::InvalidArgument { field });
    }
    Ok(())
}
