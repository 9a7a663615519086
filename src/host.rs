//! The edge host: one per process.
//!
//! Creating a host runs the ownership probe. The process that finds no owner
//! becomes the [`Role::Server`] and gets a [`Transport`]; every later process
//! becomes a [`Role::Client`] whose transport steps do nothing and whose link
//! calls are forwarded to the owner.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{RateLimitConfig, ServerConfig};
use crate::health::{HostProbe, Role};
use crate::http::{ServeError, Transport};
use crate::lifecycle::startup::StartupError;
use crate::lifecycle::Shutdown;
use crate::link::{LinkError, Linker, ModuleCatalog, ModuleRoutes};
use crate::net::Endpoint;
use crate::observability::metrics;

pub struct EdgeHost {
    config: Arc<ServerConfig>,
    endpoint: Endpoint,
    role: Role,
    linker: Arc<Linker>,
    transport: Option<Transport>,
}

impl EdgeHost {
    /// Probe for an owner and set up this process's role.
    pub async fn create(config: ServerConfig, catalog: ModuleCatalog) -> Result<Self, StartupError> {
        let config = Arc::new(config);
        let endpoint = Endpoint::from_config(&config);

        let client = HostProbe::loopback_client(Duration::from_millis(config.probe.timeout_ms))
            .map_err(StartupError::Client)?;
        let role = HostProbe::new(client.clone(), endpoint.clone(), config.internal_path.clone())
            .detect_role()
            .await;
        metrics::record_role(role);

        let routes = Arc::new(ModuleRoutes::new(config.internal_path.clone()));
        let linker = Arc::new(Linker::new(role, config.clone(), catalog, routes.clone(), client));
        let transport = match role {
            Role::Server => Some(Transport::new(config.clone(), routes, linker.clone())),
            Role::Client => None,
        };

        Ok(Self {
            config,
            endpoint,
            role,
            linker,
            transport,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn linker(&self) -> &Arc<Linker> {
        &self.linker
    }

    /// The transport, for the owning process only.
    pub fn transport(&self) -> Option<&Transport> {
        self.transport.as_ref()
    }

    fn with_transport(&mut self, step: impl FnOnce(&mut Transport)) -> &mut Self {
        if let Some(transport) = self.transport.as_mut() {
            step(transport);
        }
        self
    }

    pub fn json(&mut self, strict: bool) -> &mut Self {
        self.with_transport(|t| {
            t.json(strict);
        })
    }

    pub fn cookies(&mut self) -> &mut Self {
        self.with_transport(|t| {
            t.cookies();
        })
    }

    pub fn secure(&mut self) -> &mut Self {
        self.with_transport(|t| {
            t.secure();
        })
    }

    pub fn serve_static(&mut self, root: impl AsRef<std::path::Path>) -> &mut Self {
        self.with_transport(|t| {
            t.serve_static(root.as_ref());
        })
    }

    pub fn ratelimits(&mut self, config: &RateLimitConfig) -> &mut Self {
        self.with_transport(|t| {
            t.ratelimits(config);
        })
    }

    pub fn links(&mut self) -> &mut Self {
        self.with_transport(|t| {
            t.links();
        })
    }

    /// Apply every transport step enabled in the config.
    pub fn configure(&mut self) -> &mut Self {
        let config = self.config.clone();
        let transport = &config.transport;

        if transport.json {
            self.json(transport.json_strict);
        }
        if transport.cookies {
            self.cookies();
        }
        if transport.security_headers {
            self.secure();
        }
        if let Some(root) = &transport.static_root {
            self.serve_static(root);
        }
        if config.rate_limit.enabled {
            self.ratelimits(&config.rate_limit);
        }
        self.links()
    }

    pub async fn link_file(&self, name: &str, path: &str) -> Result<(), LinkError> {
        self.linker.link_file(name, path).await
    }

    pub async fn link_all<I, N, P>(&self, entries: I) -> Vec<Result<(), LinkError>>
    where
        I: IntoIterator<Item = (N, P)>,
        N: AsRef<str>,
        P: AsRef<str>,
    {
        self.linker.link_all(entries).await
    }

    /// Serve until shutdown. A client has nothing to serve and returns at once.
    pub async fn listen(self, shutdown: &Shutdown) -> Result<(), ServeError> {
        match self.transport {
            Some(transport) => transport.serve(shutdown).await,
            None => {
                tracing::info!(owner = %self.endpoint, "Client role, not listening");
                Ok(())
            }
        }
    }
}
