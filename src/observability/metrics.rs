//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_rate_limited_total` (counter): requests rejected with 429
//! - `edge_rate_limiter_swept_total` (counter): stale windows removed
//! - `edge_rate_limiter_keys` (gauge): windows currently tracked
//! - `edge_link_attempts_total` (counter): link outcomes by status
//! - `edge_role` (gauge): 1 when this process owns the socket

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::Role;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rate_limited() {
    metrics::counter!("edge_rate_limited_total").increment(1);
}

pub fn record_sweep(removed: usize, remaining: usize) {
    metrics::counter!("edge_rate_limiter_swept_total").increment(removed as u64);
    metrics::gauge!("edge_rate_limiter_keys").set(remaining as f64);
}

pub fn record_link(status: u16) {
    metrics::counter!("edge_link_attempts_total", "status" => status.to_string()).increment(1);
}

pub fn record_role(role: Role) {
    let owner = if role == Role::Server { 1.0 } else { 0.0 };
    metrics::gauge!("edge_role").set(owner);
}
