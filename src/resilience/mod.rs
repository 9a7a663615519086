//! Resilience subsystem for the internal link protocol.
//!
//! # Data Flow
//! ```text
//! Forwarded link request:
//!     → reqwest client timeout (every call has a deadline)
//!     → On failure: retries.rs (retry only if the owner was never reached)
//!     → backoff.rs (jittered delay before the single retry)
//! ```
//!
//! # Design Decisions
//! - A POST that reached the owner is never replayed
//! - At most one retry; the caller gets 503 after that

pub mod backoff;
pub mod retries;
