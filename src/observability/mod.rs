//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (pretty in development, JSON in production)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of formatted strings
//! - Request ID flows through every request span
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
