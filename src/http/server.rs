//! The edge's HTTP(S) transport.
//!
//! # Responsibilities
//! - Pick HTTP or HTTPS and the listening port from the [`Endpoint`]
//! - Assemble the middleware chain from the configured steps
//! - Mount the internal coordination endpoints and the module routes
//! - Serve until shutdown, with the rate limit sweeper alongside
//!
//! # Layer order (outermost first)
//! ```text
//! request id → trace → rate limit → security headers → timeout
//!     → body limit → cookies → JSON body → internal routes | module routes
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, middleware, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

use crate::config::{RateLimitConfig, ServerConfig};
use crate::http::body::{json_body_middleware, JsonOptions};
use crate::http::cookies::cookie_middleware;
use crate::http::internal::internal_router;
use crate::http::request;
use crate::lifecycle::Shutdown;
use crate::link::{Linker, ModuleRoutes};
use crate::net::{tls::load_tls_config, Endpoint};
use crate::security::{headers, rate_limit::rate_limit_middleware, RateLimiter};

/// How long in-flight HTTPS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid bind host {0:?}")]
    Address(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TLS material: {0}")]
    Tls(#[source] std::io::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listener configuration for the owning process.
pub struct Transport {
    config: Arc<ServerConfig>,
    endpoint: Endpoint,
    routes: Arc<ModuleRoutes>,
    linker: Arc<Linker>,
    json: Option<JsonOptions>,
    cookies: bool,
    security_headers: bool,
    rate_limiter: Option<(Arc<RateLimiter>, Duration)>,
    links: bool,
}

impl Transport {
    pub fn new(config: Arc<ServerConfig>, routes: Arc<ModuleRoutes>, linker: Arc<Linker>) -> Self {
        Self {
            endpoint: Endpoint::from_config(&config),
            config,
            routes,
            linker,
            json: None,
            cookies: false,
            security_headers: false,
            rate_limiter: None,
            links: false,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Parse JSON request bodies. `strict` accepts only objects and arrays.
    pub fn json(&mut self, strict: bool) -> &mut Self {
        self.json = Some(JsonOptions {
            strict,
            limit: self.config.transport.max_body_size,
        });
        self
    }

    pub fn cookies(&mut self) -> &mut Self {
        self.cookies = true;
        self
    }

    /// Hardening headers; identifying headers are stripped.
    pub fn secure(&mut self) -> &mut Self {
        self.security_headers = true;
        self
    }

    /// Serve files below `root` for paths nothing else matched.
    pub fn serve_static(&mut self, root: &Path) -> &mut Self {
        tracing::info!(root = %root.display(), "Serving static assets");
        self.routes.set_fallback_dir(root);
        self
    }

    /// Per-IP rate limiting. A second call keeps the first limiter.
    pub fn ratelimits(&mut self, config: &RateLimitConfig) -> &mut Self {
        if self.rate_limiter.is_some() {
            tracing::debug!("Rate limiter already installed");
            return self;
        }
        let limiter = RateLimiter::from_config(config).with_internal_prefix(self.config.internal_path.clone());
        self.rate_limiter = Some((
            Arc::new(limiter),
            Duration::from_secs(config.sweep_interval_secs),
        ));
        self
    }

    /// Mount the internal coordination endpoints.
    pub fn links(&mut self) -> &mut Self {
        self.links = true;
        self
    }

    pub fn rate_limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.rate_limiter.as_ref().map(|(limiter, _)| limiter)
    }

    /// Build the serving router.
    #[allow(deprecated)]
    pub fn build_router(&self) -> Router {
        let mut router = Router::new();
        if self.links {
            router = router.merge(internal_router(&self.config.internal_path, self.linker.clone()));
        }

        let routes = self.routes.clone();
        router = router.fallback(move |request: Request<Body>| {
            let routes = routes.clone();
            async move { routes.dispatch(request).await }
        });

        if let Some(options) = self.json {
            router = router.layer(middleware::from_fn_with_state(options, json_body_middleware));
        }
        if self.cookies {
            router = router.layer(middleware::from_fn(cookie_middleware));
        }

        let transport = &self.config.transport;
        router = router
            .layer(RequestBodyLimitLayer::new(transport.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(transport.request_timeout_secs)));

        if self.security_headers {
            router = headers::apply(router, self.endpoint.is_secure());
        }
        if let Some((limiter, _)) = &self.rate_limiter {
            router = router.layer(middleware::from_fn_with_state(limiter.clone(), rate_limit_middleware));
        }

        request::apply(router)
    }

    fn bind_addr(&self) -> Result<SocketAddr, ServeError> {
        let host = &self.config.transport.bind_host;
        let ip: IpAddr = host.parse().map_err(|_| ServeError::Address(host.clone()))?;
        Ok(SocketAddr::new(ip, self.endpoint.port()))
    }

    /// Bind the listener and serve until `shutdown` fires.
    pub async fn serve(self, shutdown: &Shutdown) -> Result<(), ServeError> {
        let addr = self.bind_addr()?;
        let app = self.build_router().into_make_service_with_connect_info::<SocketAddr>();

        let tls = if self.endpoint.is_secure() {
            let https = &self.config.https;
            Some(load_tls_config(&https.cert, &https.key).await.map_err(ServeError::Tls)?)
        } else {
            None
        };

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })?;

        // Only a bound listener gets a sweeper.
        if let Some((limiter, interval)) = &self.rate_limiter {
            tokio::spawn(limiter.clone().run_sweeper(*interval, shutdown.subscribe()));
        }

        if let Some(tls) = tls {
            let listener = listener.into_std()?;
            let handle = axum_server::Handle::new();
            let drain = handle.clone();
            let signalled = shutdown.signalled();
            tokio::spawn(async move {
                signalled.await;
                drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
            });

            tracing::info!(address = %addr, "HTTPS server starting");
            axum_server::from_tcp_rustls(listener, tls)
                .handle(handle)
                .serve(app)
                .await?;
        } else {
            tracing::info!(address = %addr, "HTTP server starting");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.signalled())
                .await?;
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::Role;
    use crate::link::{ModuleCatalog, Resolver};
    use axum::extract::ConnectInfo;
    use axum::http::StatusCode;
    use axum::routing::get;
    use reqwest::Client;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn transport(config: ServerConfig) -> Transport {
        let config = Arc::new(config);
        let routes = Arc::new(ModuleRoutes::new(config.internal_path.clone()));
        let catalog = ModuleCatalog::new().register("hello", |host| host.route("/hello", get(|| async { "hello" })));
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        let linker = Arc::new(
            Linker::new(Role::Server, config.clone(), catalog, routes.clone(), Client::new())
                .with_resolver(Resolver::new(fixtures)),
        );
        Transport::new(config, routes, linker)
    }

    fn from(path: &str, peer: &str) -> Request<Body> {
        let mut request = Request::builder().uri(path).body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        request
    }

    #[tokio::test]
    async fn internal_routes_only_when_linking_enabled() {
        let plain = transport(ServerConfig::default()).build_router();
        let response = plain.oneshot(from("/internal/check", "127.0.0.1:1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let mut linked = transport(ServerConfig::default());
        linked.links();
        let response = linked.build_router().oneshot(from("/internal/check", "127.0.0.1:1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn every_response_carries_a_request_id() {
        let response = transport(ServerConfig::default())
            .build_router()
            .oneshot(from("/nothing", "127.0.0.1:1"))
            .await
            .unwrap();
        assert!(response.headers().contains_key(&request::X_REQUEST_ID));
    }

    #[tokio::test]
    async fn linked_module_route_is_served() {
        let mut transport = transport(ServerConfig::default());
        transport.links();
        transport.linker.link_file("hello", "hello.toml").await.unwrap();

        let response = transport.build_router().oneshot(from("/hello", "10.0.0.1:1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rate_limit_is_installed_once() {
        let mut config = ServerConfig::default();
        config.rate_limit.max_requests = 0;
        let mut transport = transport(config.clone());
        transport.ratelimits(&config.rate_limit);
        let first = transport.rate_limiter().cloned().unwrap();
        transport.ratelimits(&config.rate_limit);
        assert!(Arc::ptr_eq(&first, transport.rate_limiter().unwrap()));

        let app = transport.build_router();
        let ok = app.clone().oneshot(from("/api", "10.0.0.1:1")).await.unwrap();
        assert_eq!(ok.status(), StatusCode::NOT_FOUND);
        let blocked = app.oneshot(from("/api", "10.0.0.1:1")).await.unwrap();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn security_headers_strip_identifying_headers() {
        let mut transport = transport(ServerConfig::default());
        transport.secure();
        let response = transport.build_router().oneshot(from("/x", "10.0.0.1:1")).await.unwrap();
        assert!(!response.headers().contains_key("x-powered-by"));
        assert!(response.headers().contains_key("x-content-type-options"));
    }

    #[tokio::test]
    async fn failed_bind_leaves_no_sweeper_behind() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = ServerConfig::default();
        config.local_port = taken.local_addr().unwrap().port();
        config.transport.bind_host = "127.0.0.1".into();

        let mut transport = transport(config.clone());
        transport.ratelimits(&config.rate_limit);
        let limiter = transport.rate_limiter().cloned().unwrap();

        let err = transport.serve(&Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, ServeError::Bind { .. }), "{err}");
        assert_eq!(Arc::strong_count(&limiter), 1);
    }

    #[test]
    fn bad_bind_host_is_rejected() {
        let mut config = ServerConfig::default();
        config.transport.bind_host = "not-an-ip".into();
        assert!(matches!(transport(config).bind_addr(), Err(ServeError::Address(_))));
    }
}
