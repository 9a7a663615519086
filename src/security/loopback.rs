//! Loopback-origin trust.
//!
//! The coordination endpoints trust a caller only when the connection
//! originates from the local machine.

use std::net::{IpAddr, SocketAddr};

use axum::{body::Body, extract::ConnectInfo, http::Request};

/// `127.0.0.0/8`, `::1` and IPv4-mapped IPv6 loopback (`::ffff:127.0.0.1`).
pub fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback(),
        IpAddr::V6(v6) => v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
    }
}

/// Peer address recorded by the listener, if any.
pub fn peer_addr(request: &Request<Body>) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// The request came from this machine. Requests without a recorded peer are
/// not trusted.
pub fn is_loopback_request(request: &Request<Body>) -> bool {
    peer_addr(request).is_some_and(|addr| is_loopback(addr.ip()))
}
