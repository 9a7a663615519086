//! Cookie header parsing.
//!
//! The middleware parses `Cookie` headers once into a [`Cookies`] extension;
//! handlers extract `Cookies` directly (parsed on demand when the middleware
//! is not installed).

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    /// Parse every `Cookie` header. The first occurrence of a name wins.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            for pair in value.split(';') {
                let Some((name, raw)) = pair.split_once('=') else { continue };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let raw = raw.trim();
                let value = raw
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(raw);
                cookies
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        Self(cookies)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S> FromRequestParts<S> for Cookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Cookies>()
            .cloned()
            .unwrap_or_else(|| Cookies::from_headers(&parts.headers)))
    }
}

pub async fn cookie_middleware(mut request: Request<Body>, next: Next) -> Response {
    let cookies = Cookies::from_headers(request.headers());
    request.extensions_mut().insert(cookies);
    next.run(request).await
}
