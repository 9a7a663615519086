//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig
//!     → endpoint.rs (scheme, port, loopback URL of the owning process)
//!     → tls.rs (rustls config from PEM bytes, HTTPS only)
//!     → Hand off to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - The endpoint is derived once and never changes for the process lifetime
//! - TLS is selected only in production with complete key material

pub mod endpoint;
pub mod tls;

pub use endpoint::{Endpoint, Scheme};
