//! Shared HTTP edge coordination.
//!
//! Many independently started processes on one machine share a single
//! HTTP(S) listener. The first process to start owns the socket; later ones
//! detect it and forward module registrations to it over loopback.

pub mod builtin;
pub mod config;
pub mod health;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod link;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::ServerConfig;
pub use health::Role;
pub use host::EdgeHost;
pub use lifecycle::Shutdown;
pub use link::{LinkError, ModuleCatalog, ModuleHost};
