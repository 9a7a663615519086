//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP fixed window, before any handler)
//!     → loopback.rs (trust decision for the internal endpoints)
//!     → handler
//!     → headers.rs (hardening headers, strip identifying headers)
//! ```
//!
//! # Design Decisions
//! - Remote callers never learn the coordination surface exists
//! - No trust in client input beyond the connection's peer address

pub mod headers;
pub mod loopback;
pub mod rate_limit;

pub use loopback::{is_loopback, is_loopback_request};
pub use rate_limit::{Admission, RateLimiter};
