//! Host probe: does another process already own the edge socket?

use std::fmt;
use std::time::Duration;

use reqwest::Client;

use crate::net::Endpoint;

/// Whether this process owns the listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the socket and the link registry.
    Server,
    /// Forwards everything to the owning process.
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => f.write_str("server"),
            Role::Client => f.write_str("client"),
        }
    }
}

/// Outcome of the single check attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The owner answered with this status.
    Answered(u16),
    /// No HTTP exchange happened.
    Unreachable(String),
}

impl ProbeOutcome {
    pub fn role(&self) -> Role {
        match self {
            ProbeOutcome::Answered(_) => Role::Client,
            ProbeOutcome::Unreachable(_) => Role::Server,
        }
    }
}

pub struct HostProbe {
    client: Client,
    endpoint: Endpoint,
    internal_path: String,
}

impl HostProbe {
    pub fn new(client: Client, endpoint: Endpoint, internal_path: impl Into<String>) -> Self {
        Self {
            client,
            endpoint,
            internal_path: internal_path.into(),
        }
    }

    /// Build the loopback client used for the probe and for forwarded links.
    ///
    /// The owner's certificate is issued for the public host name, never for
    /// `localhost`, so certificate checks are off for this loopback-only client.
    pub fn loopback_client(timeout: Duration) -> Result<Client, reqwest::Error> {
        Client::builder()
            .timeout(timeout)
            .no_proxy()
            .danger_accept_invalid_certs(true)
            .build()
    }

    /// Run the single check attempt.
    pub async fn probe(&self) -> ProbeOutcome {
        let url = match self.endpoint.internal_url(&self.internal_path, "/check") {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build host check URL");
                return ProbeOutcome::Unreachable(e.to_string());
            }
        };

        match self.client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                tracing::info!(url = %url, status = %status, "Host check answered");
                ProbeOutcome::Answered(status.as_u16())
            }
            Err(e) if e.is_timeout() => {
                tracing::info!(url = %url, "Host check timed out");
                ProbeOutcome::Unreachable("timeout".to_string())
            }
            Err(e) => {
                tracing::info!(url = %url, error = %e, "Host check failed");
                ProbeOutcome::Unreachable(e.to_string())
            }
        }
    }

    /// Decide this process's role.
    pub async fn detect_role(&self) -> Role {
        let role = self.probe().await.role();
        tracing::info!(role = %role, endpoint = %self.endpoint, "Role decided");
        role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn endpoint_on(port: u16) -> Endpoint {
        let mut config = ServerConfig::default();
        config.local_port = port;
        Endpoint::from_config(&config)
    }

    #[tokio::test]
    async fn nobody_listening_means_server() {
        // Bind then drop to get a port that refuses connections.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HostProbe::loopback_client(Duration::from_millis(500)).unwrap();
        let probe = HostProbe::new(client, endpoint_on(port), "/internal");

        assert!(matches!(probe.probe().await, ProbeOutcome::Unreachable(_)));
        assert_eq!(probe.detect_role().await, Role::Server);
    }

    #[tokio::test]
    async fn any_answer_means_client() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket
                    .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
                let _ = socket.shutdown().await;
            }
        });

        let client = HostProbe::loopback_client(Duration::from_millis(500)).unwrap();
        let probe = HostProbe::new(client, endpoint_on(port), "/internal");

        assert_eq!(probe.probe().await, ProbeOutcome::Answered(404));
        assert_eq!(probe.detect_role().await, Role::Client);
    }

    #[tokio::test]
    async fn silent_listener_times_out_to_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accept and hold connections without ever answering.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = HostProbe::loopback_client(Duration::from_millis(200)).unwrap();
        let probe = HostProbe::new(client, endpoint_on(port), "/internal");

        assert_eq!(probe.detect_role().await, Role::Server);
    }
}
