//! The route surface linked modules mount onto.
//!
//! Axum routers are immutable once serving, so module routes live in their
//! own router behind an [`ArcSwap`]. The serving router forwards every
//! unmatched request to [`ModuleRoutes::dispatch`], which always sees the
//! latest snapshot. Mounting builds a new router and swaps it in.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Router,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::config::ServerConfig;
use crate::health::Role;
use crate::link::error::MountError;

/// Routes mounted by linked modules.
pub struct ModuleRoutes {
    router: ArcSwap<Router>,
    /// Guards mounting; reads go through `router` without locking.
    mounted: Mutex<HashSet<String>>,
    reserved_prefix: String,
}

impl ModuleRoutes {
    /// `reserved_prefix` is the internal path; modules may not mount below it.
    pub fn new(reserved_prefix: impl Into<String>) -> Self {
        Self {
            router: ArcSwap::from_pointee(Router::new()),
            mounted: Mutex::new(HashSet::new()),
            reserved_prefix: reserved_prefix.into(),
        }
    }

    pub fn route(&self, path: &str, method_router: MethodRouter) -> Result<(), MountError> {
        self.mount(path, |router| router.route(path, method_router))
    }

    pub fn nest(&self, prefix: &str, nested: Router) -> Result<(), MountError> {
        self.check_prefix(prefix)?;
        self.mount(prefix, |router| router.nest(prefix, nested))
    }

    /// Serve files from `dir` below `prefix`.
    pub fn static_dir(&self, prefix: &str, dir: &Path) -> Result<(), MountError> {
        self.check_prefix(prefix)?;
        let service = ServeDir::new(dir);
        self.mount(prefix, |router| router.nest_service(prefix, service))
    }

    /// Serve files from `root` for every path nothing else matched.
    pub fn set_fallback_dir(&self, root: &Path) {
        let _guard = self.mounted.lock().unwrap_or_else(PoisonError::into_inner);
        let next = (**self.router.load()).clone().fallback_service(ServeDir::new(root));
        self.router.store(Arc::new(next));
    }

    /// Paths mounted so far, sorted.
    pub fn mounted(&self) -> Vec<String> {
        let mounted = self.mounted.lock().unwrap_or_else(PoisonError::into_inner);
        let mut paths: Vec<_> = mounted.iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Run `request` through the current module router.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let router = (*self.router.load_full()).clone();
        match router.oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        }
    }

    fn check_prefix(&self, prefix: &str) -> Result<(), MountError> {
        if prefix == "/" || prefix.ends_with('/') {
            return Err(MountError::InvalidPath(prefix.to_string()));
        }
        Ok(())
    }

    fn mount(&self, path: &str, build: impl FnOnce(Router) -> Router) -> Result<(), MountError> {
        if !path.starts_with('/') {
            return Err(MountError::InvalidPath(path.to_string()));
        }
        if path == self.reserved_prefix || path.starts_with(&format!("{}/", self.reserved_prefix)) {
            return Err(MountError::Reserved(path.to_string()));
        }

        let mut mounted = self.mounted.lock().unwrap_or_else(PoisonError::into_inner);
        if mounted.contains(path) {
            return Err(MountError::Duplicate(path.to_string()));
        }

        let current = (**self.router.load()).clone();
        // Axum panics on malformed or overlapping paths.
        let next = panic::catch_unwind(AssertUnwindSafe(|| build(current)))
            .map_err(|_| MountError::InvalidPath(path.to_string()))?;

        self.router.store(Arc::new(next));
        mounted.insert(path.to_string());
        tracing::info!(path, "Module route mounted");
        Ok(())
    }
}

/// Handle passed to a linked module's entry point.
#[derive(Clone)]
pub struct ModuleHost {
    routes: Arc<ModuleRoutes>,
    config: Arc<ServerConfig>,
    role: Role,
}

impl ModuleHost {
    pub fn new(routes: Arc<ModuleRoutes>, config: Arc<ServerConfig>, role: Role) -> Self {
        Self {
            routes,
            config,
            role,
        }
    }

    /// Mount a handler at `path`.
    pub fn route(&self, path: &str, method_router: MethodRouter) -> Result<(), MountError> {
        self.routes.route(path, method_router)
    }

    /// Mount a whole router below `prefix`.
    pub fn nest(&self, prefix: &str, router: Router) -> Result<(), MountError> {
        self.routes.nest(prefix, router)
    }

    /// Serve a directory below `prefix`.
    pub fn static_dir(&self, prefix: &str, dir: impl AsRef<Path>) -> Result<(), MountError> {
        self.routes.static_dir(prefix, dir.as_ref())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mounted(&self) -> Vec<String> {
        self.routes.mounted()
    }
}
