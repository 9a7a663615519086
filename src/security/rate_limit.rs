//! Per-IP fixed-window rate limiting.
//!
//! Each source IP owns a [`Window`] counting requests since the window
//! started. A window that has outlived its length is reset on the next
//! request and removed by the periodic sweep if nothing touches it.
//!
//! Admission allows `max + 1` requests per window: the counter is compared
//! with `>` before it is incremented.
//!
//! Loopback callers on the internal prefix are not counted, so a burst of
//! forwarded link requests cannot lock sibling processes out.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::loopback;

/// Path suffixes that bypass the limiter (static assets, debug files).
pub const EXEMPT_SUFFIXES: &[&str] = &[
    ".txt", ".json", ".map", ".di", ".list", ".html", ".css", ".js", ".ico", ".png", ".mp3",
    ".gif", ".woff2",
];

/// Result of consulting a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Blocked,
}

/// Request counter for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    count: u32,
    started: Instant,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            started: now,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// The window has run longer than `length`.
    pub fn is_stale(&self, now: Instant, length: Duration) -> bool {
        now.saturating_duration_since(self.started) > length
    }

    fn admit(&mut self, now: Instant, max: u32, length: Duration) -> Admission {
        if self.is_stale(now, length) {
            *self = Self::new(now);
        }
        if self.count > max {
            return Admission::Blocked;
        }
        self.count += 1;
        Admission::Allowed
    }
}

/// Shared limiter state keyed by source IP.
///
/// `DashMap` shard locks serialize `check` per key and let `sweep` run
/// alongside inserts of unrelated keys.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max: u32,
    window: Duration,
    internal_prefix: Option<String>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max,
            window,
            internal_prefix: None,
        }
    }

    /// Let loopback callers reach `prefix` and everything below it unlimited.
    pub fn with_internal_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.internal_prefix = Some(prefix.into());
        self
    }

    fn is_internal(&self, path: &str) -> bool {
        self.internal_prefix.as_deref().is_some_and(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.window_ms))
    }

    /// Count a request for `key` at the current instant.
    pub fn check(&self, key: &str) -> Admission {
        self.check_at(key, Instant::now())
    }

    /// Count a request for `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> Admission {
        let mut window = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window::new(now));
        window.admit(now, self.max, self.window)
    }

    /// Remove every stale window, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.windows.retain(|_, window| {
            let stale = window.is_stale(now, self.window);
            if stale {
                removed += 1;
            }
            !stale
        });
        removed
    }

    /// Snapshot of the window for `key`.
    pub fn window(&self, key: &str) -> Option<Window> {
        self.windows.get(key).map(|w| w.value().clone())
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Run the sweep every `interval` until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = interval.as_secs(), "Rate limit sweeper starting");

        let mut ticker = time::interval(interval);
        // The first tick completes immediately; nothing can be stale yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep();
                    metrics::record_sweep(removed, self.tracked_keys());
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_keys(), "Swept stale rate limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Requests for these paths are never limited.
pub fn is_exempt(path: &str) -> bool {
    EXEMPT_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Middleware function for per-IP rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>().copied() else {
        tracing::warn!(path = %request.uri().path(), "Request without a source address");
        return (StatusCode::BAD_REQUEST, "Unresolvable client address").into_response();
    };

    if loopback::is_loopback(addr.ip()) && limiter.is_internal(request.uri().path()) {
        return next.run(request).await;
    }

    let client = addr.ip().to_string();
    match limiter.check(&client) {
        Admission::Allowed => next.run(request).await,
        Admission::Blocked => {
            tracing::warn!(client = %client, "Rate limit exceeded");
            metrics::record_rate_limited();
            (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
        }
    }
}
