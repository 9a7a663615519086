//! Module linking subsystem.
//!
//! # Data Flow
//! ```text
//! link_file(name, path)
//!     → validate name/path (400)
//!     → resolve.rs (literal, cwd, base dir; 404)
//!     → catalog.rs (manifest → compiled entry point; 500)
//!     → Role::Client: forward.rs (POST to owner; status relayed, 503 if unreachable)
//!     → Role::Server: registry.rs (unique name; 409)
//!                     → entry point mounts routes through host.rs
//!     → 201
//! ```
//!
//! # Design Decisions
//! - Modules are compiled in; a manifest on disk only selects one
//! - The registry is insert-only for the owner's lifetime
//! - Every attempt ends in exactly one status code

pub mod catalog;
pub mod error;
pub mod forward;
pub mod host;
pub mod linker;
pub mod registry;
pub mod resolve;

pub use catalog::{LinkFn, ModuleCatalog, ModuleManifest};
pub use error::{outcome_status, LinkError, MountError};
pub use forward::LinkRequest;
pub use host::{ModuleHost, ModuleRoutes};
pub use linker::Linker;
pub use registry::LinkRegistry;
pub use resolve::Resolver;
