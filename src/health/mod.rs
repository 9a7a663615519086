//! Role detection subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Endpoint + internal path
//!     → probe.rs (one GET to {internal_path}/check, bounded by a timeout)
//!     → Role::Client  (someone answered: they own the socket)
//!     → Role::Server  (nobody answered: bind the socket ourselves)
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt decides the role; no retry loop
//! - Any HTTP response counts as an owner, whatever its status
//! - Role never changes for the process lifetime

pub mod probe;

pub use probe::{HostProbe, Role};
