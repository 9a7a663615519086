//! Request identification.
//!
//! Every request gets an `x-request-id` (UUID v4) as early as possible; a
//! caller-supplied ID is kept. The ID is echoed on the response and recorded
//! on the request span.

use axum::{
    body::Body,
    http::{HeaderName, Request},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request's ID, or `"unknown"` before the ID layer ran.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request),
    )
}

/// Wrap `router` with tracing and request ID layers (outermost).
pub fn apply(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn generates_and_echoes_id() {
        let app = apply(Router::new().route("/", get(|| async { "ok" })));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()[&X_REQUEST_ID].to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn keeps_caller_id() {
        let app = apply(Router::new().route("/", get(|| async { "ok" })));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(&X_REQUEST_ID, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[&X_REQUEST_ID], "abc-123");
    }
}
