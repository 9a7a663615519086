//! Loopback-only coordination endpoints.
//!
//! `GET {internal}/check` answers sibling processes probing for an owner.
//! `POST {internal}/link` registers a module on this process. Neither endpoint
//! is visible to remote callers: `check` answers them 404 and `link` 401.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::http::body::JsonBody;
use crate::link::{LinkError, LinkRequest, Linker};
use crate::security::loopback;

pub fn internal_router(internal_path: &str, linker: Arc<Linker>) -> Router {
    Router::new()
        .route(&format!("{internal_path}/check"), get(check))
        .route(&format!("{internal_path}/link"), post(link))
        .with_state(linker)
}

async fn check(request: Request<Body>) -> StatusCode {
    if !loopback::is_loopback_request(&request) {
        tracing::debug!(peer = ?loopback::peer_addr(&request), "Ownership check from remote caller");
        return StatusCode::NOT_FOUND;
    }
    StatusCode::OK
}

async fn link(State(linker): State<Arc<Linker>>, request: Request<Body>) -> Response {
    if !loopback::is_loopback_request(&request) {
        tracing::warn!(peer = ?loopback::peer_addr(&request), "Link request from remote caller refused");
        return LinkError::NotLoopback.into_response();
    }

    let link_request = match parse_link_request(request).await {
        Ok(link_request) => link_request,
        Err(e) => return e.into_response(),
    };

    match linker.link_file(&link_request.name, &link_request.path).await {
        Ok(()) => (StatusCode::CREATED, "Created").into_response(),
        Err(e) => e.into_response(),
    }
}

/// Read the request body as a [`LinkRequest`]. Uses the parsed body when the
/// JSON middleware already ran.
async fn parse_link_request(request: Request<Body>) -> Result<LinkRequest, LinkError> {
    if let Some(JsonBody(value)) = request.extensions().get::<JsonBody>() {
        return serde_json::from_value(value.clone())
            .map_err(|_| LinkError::InvalidArgument { field: "body" });
    }

    let bytes: Bytes = axum::body::to_bytes(request.into_body(), 64 * 1024)
        .await
        .map_err(|_| LinkError::InvalidArgument { field: "body" })?;
    if bytes.is_empty() {
        return Ok(LinkRequest::default());
    }
    serde_json::from_slice(&bytes).map_err(|_| LinkError::InvalidArgument { field: "body" })
}
