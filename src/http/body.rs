//! JSON body parsing middleware.
//!
//! Requests declaring a JSON content type are parsed once, up front. The
//! parsed value is attached as a [`JsonBody`] extension and the raw bytes are
//! put back, so handlers can use either. An empty body parses as `{}`.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct JsonOptions {
    /// Only objects and arrays are accepted at the top level.
    pub strict: bool,
    /// Maximum body size read into memory.
    pub limit: usize,
}

/// Parsed JSON request body.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

fn parse(bytes: &[u8], strict: bool) -> Result<Value, &'static str> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value = serde_json::from_slice(bytes).map_err(|_| "Malformed JSON body")?;
    if strict && !(value.is_object() || value.is_array()) {
        return Err("JSON body must be an object or array");
    }
    Ok(value)
}

pub async fn json_body_middleware(
    State(options): State<JsonOptions>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_json(request.headers()) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, options.limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read JSON body");
            return (StatusCode::BAD_REQUEST, "Unreadable request body").into_response();
        }
    };

    let value = match parse(&bytes, options.strict) {
        Ok(value) => value,
        Err(reason) => return (StatusCode::BAD_REQUEST, reason).into_response(),
    };

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(JsonBody(value));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::post, Extension, Router};
    use tower::ServiceExt;

    fn app(strict: bool) -> Router {
        Router::new()
            .route(
                "/",
                post(|Extension(JsonBody(value)): Extension<JsonBody>| async move { value.to_string() }),
            )
            .layer(middleware::from_fn_with_state(
                JsonOptions { strict, limit: 1024 },
                json_body_middleware,
            ))
    }

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn detects_json_content_types() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/vnd.api+json".parse().unwrap());
        assert!(is_json(&headers));
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json(&headers));
    }

    #[tokio::test]
    async fn parsed_value_reaches_handler() {
        let response = app(false).oneshot(json_request(r#"{"a":1}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let response = app(false).oneshot(json_request("{nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn strict_rejects_scalars() {
        let response = app(true).oneshot(json_request("42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(false).oneshot(json_request("42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(parse(b"  ", true).unwrap(), Value::Object(Default::default()));
    }
}
