//! Forwarding link requests to the owning process.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LinkConfig;
use crate::link::error::LinkError;
use crate::net::Endpoint;
use crate::resilience::{backoff::link_backoff, retries};

/// Body of `POST {internal_path}/link`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

/// Client side of the internal link protocol.
pub struct Forwarder {
    client: Client,
    endpoint: Endpoint,
    internal_path: String,
    config: LinkConfig,
}

impl Forwarder {
    pub fn new(client: Client, endpoint: Endpoint, internal_path: impl Into<String>, config: LinkConfig) -> Self {
        Self {
            client,
            endpoint,
            internal_path: internal_path.into(),
            config,
        }
    }

    /// POST `request` to the owner.
    ///
    /// Any 2xx is success; other statuses come back as [`LinkError::Upstream`]
    /// unchanged. A connection that could not be established is retried once.
    pub async fn forward(&self, request: &LinkRequest) -> Result<(), LinkError> {
        let url = self
            .endpoint
            .internal_url(&self.internal_path, "/link")
            .map_err(|e| LinkError::UpstreamUnreachable {
                reason: e.to_string(),
            })?;
        let timeout = Duration::from_millis(self.config.forward_timeout_ms);
        let max_attempts = retries::max_attempts(&self.config);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let sent = self
                .client
                .post(url.clone())
                .timeout(timeout)
                .json(request)
                .send()
                .await;

            match sent {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(name = %request.name, status = %response.status(), "Owner accepted link");
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    tracing::warn!(name = %request.name, status = %status, "Owner rejected link");
                    return Err(LinkError::Upstream(status));
                }
                Err(e) if attempt < max_attempts && retries::is_retryable(&e) => {
                    let delay = link_backoff(attempt, &self.config);
                    tracing::info!(name = %request.name, attempt, delay = ?delay, error = %e, "Retrying link forward");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(name = %request.name, attempt, error = %e, "Owning process unreachable");
                    return Err(LinkError::UpstreamUnreachable {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn missing_fields_deserialize_empty() {
        let request: LinkRequest = serde_json::from_str(r#"{"name":"chat"}"#).unwrap();
        assert_eq!(request.name, "chat");
        assert_eq!(request.path, "");
    }

    #[tokio::test]
    async fn unreachable_owner_is_503() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut config = ServerConfig::default();
        config.local_port = port;
        config.link.retry_base_delay_ms = 1;

        let forwarder = Forwarder::new(
            Client::new(),
            Endpoint::from_config(&config),
            "/internal",
            config.link.clone(),
        );
        let err = forwarder
            .forward(&LinkRequest {
                name: "chat".into(),
                path: "/srv/chat.toml".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 503);
    }
}
