//! HTTP surface of the owning process.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Transport: listener, middleware chain)
//!     → request.rs (request id, trace span)
//!     → cookies.rs / body.rs (optional parsing steps)
//!     → internal.rs (loopback-only check/link endpoints)
//!     → module routes mounted by linked modules
//! ```

pub mod body;
pub mod cookies;
pub mod internal;
pub mod request;
pub mod server;

pub use body::{JsonBody, JsonOptions};
pub use cookies::Cookies;
pub use request::X_REQUEST_ID;
pub use server::{ServeError, Transport};
