//! Security response headers.
//!
//! Adds a helmet-style set of hardening headers (only when the handler did
//! not set its own) and strips headers that identify the server software.

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Headers added to every response.
const DEFAULT_HEADERS: [(HeaderName, &str); 8] = [
    (header::CONTENT_SECURITY_POLICY, "default-src 'self'; base-uri 'self'; frame-ancestors 'self'; object-src 'none'"),
    (HeaderName::from_static("cross-origin-opener-policy"), "same-origin"),
    (HeaderName::from_static("cross-origin-resource-policy"), "same-origin"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_DNS_PREFETCH_CONTROL, "off"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::X_XSS_PROTECTION, "0"),
];

const HSTS: &str = "max-age=15552000; includeSubDomains";

/// Wrap `router` with the security header layers.
///
/// HSTS is only sent when the listener is HTTPS.
pub fn apply(mut router: Router, secure: bool) -> Router {
    for (name, value) in DEFAULT_HEADERS {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ));
    }
    if secure {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        ));
    }
    router.layer(middleware::from_fn(strip_identifying_headers))
}

async fn strip_identifying_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.remove(X_POWERED_BY);
    headers.remove(header::SERVER);
    response
}
