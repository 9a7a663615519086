//! Local endpoint of the owning process.
//!
//! Every instance on a machine derives the same endpoint from the same
//! config, which is what lets a late starter find the process that owns the
//! socket.

use std::fmt;

use url::Url;

use crate::config::ServerConfig;

/// Ports used in production.
const HTTP_PORT: u16 = 80;
const HTTPS_PORT: u16 = 443;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Scheme and port the edge listens on, plus its loopback URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    port: u16,
}

impl Endpoint {
    /// Derive the endpoint from configuration.
    ///
    /// HTTPS requires production mode and both key and certificate; there is
    /// no local secure port.
    pub fn from_config(config: &ServerConfig) -> Self {
        let secure = config.is_production && config.https.has_material();
        let port = match (secure, config.is_production) {
            (true, _) => HTTPS_PORT,
            (false, true) => HTTP_PORT,
            (false, false) => config.local_port,
        };
        Self {
            scheme: if secure { Scheme::Https } else { Scheme::Http },
            port,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// `scheme://localhost:port`
    pub fn address(&self) -> String {
        format!("{}://localhost:{}", self.scheme.as_str(), self.port)
    }

    /// URL of an endpoint below the internal path, e.g. `/internal` + `/check`.
    pub fn internal_url(&self, internal_path: &str, route: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}{}{}", self.address(), internal_path, route))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}
