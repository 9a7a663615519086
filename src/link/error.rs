//! Link error types.
//!
//! Every registration attempt, local or forwarded, ends in exactly one HTTP
//! status. [`LinkError::status`] is that mapping.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// Name or path missing or shorter than two characters.
    #[error("invalid {field}: must be at least 2 characters")]
    InvalidArgument { field: &'static str },

    /// Caller is not on this machine.
    #[error("caller is not a loopback address")]
    NotLoopback,

    /// No candidate location for the module exists.
    #[error("module not found: {path}")]
    NotFound { path: String },

    /// The module has no usable entry point.
    #[error("module at {} has no usable entry point: {reason}", .path.display())]
    InvalidExport { path: PathBuf, reason: String },

    /// A module with this name is already linked.
    #[error("module {name:?} is already linked")]
    Conflict { name: String },

    /// The owning process could not be reached.
    #[error("owning process unreachable: {reason}")]
    UpstreamUnreachable { reason: String },

    /// The owning process answered with a non-success status.
    #[error("owning process rejected the link with status {0}")]
    Upstream(StatusCode),
}

impl LinkError {
    pub fn status(&self) -> StatusCode {
        match self {
            LinkError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            LinkError::NotLoopback => StatusCode::UNAUTHORIZED,
            LinkError::NotFound { .. } => StatusCode::NOT_FOUND,
            LinkError::InvalidExport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            LinkError::Conflict { .. } => StatusCode::CONFLICT,
            LinkError::UpstreamUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            LinkError::Upstream(status) => *status,
        }
    }
}

impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

/// Status of a finished link attempt: 201 on success.
pub fn outcome_status(outcome: &Result<(), LinkError>) -> StatusCode {
    match outcome {
        Ok(()) => StatusCode::CREATED,
        Err(e) => e.status(),
    }
}

/// A linked module could not mount one of its routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("path {0:?} must start with '/'")]
    InvalidPath(String),

    #[error("path {0:?} is already mounted")]
    Duplicate(String),

    #[error("path {0:?} is reserved for the internal endpoints")]
    Reserved(String),
}
