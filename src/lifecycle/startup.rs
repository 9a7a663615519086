//! Startup orchestration.
//!
//! Probe → transport steps → startup modules → listen. Any failure before
//! the listener is up is fatal: a startup module that does not link with 201
//! aborts the process instead of leaving it half-configured.

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::host::EdgeHost;
use crate::http::ServeError;
use crate::lifecycle::Shutdown;
use crate::link::{outcome_status, ModuleCatalog};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build loopback client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("startup module {name:?} failed to link with status {status}")]
    Link { name: String, status: StatusCode },

    #[error(transparent)]
    Serve(#[from] ServeError),
}

/// Module to link at startup, as `name=path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupLink {
    pub name: String,
    pub path: String,
}

impl std::str::FromStr for StartupLink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected name=path, got {s:?}"))?;
        Ok(Self {
            name: name.trim().to_string(),
            path: path.trim().to_string(),
        })
    }
}

/// Create the host, link `links`, and serve until `shutdown`.
pub async fn run(
    config: ServerConfig,
    catalog: ModuleCatalog,
    links: &[StartupLink],
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    let mut host = EdgeHost::create(config, catalog).await?;
    host.configure();
    tracing::info!(role = %host.role(), endpoint = %host.endpoint(), "Edge host created");

    let outcomes = host
        .link_all(links.iter().map(|l| (l.name.as_str(), l.path.as_str())))
        .await;
    for (link, outcome) in links.iter().zip(&outcomes) {
        let status = outcome_status(outcome);
        if status != StatusCode::CREATED {
            return Err(StartupError::Link {
                name: link.name.clone(),
                status,
            });
        }
    }

    host.listen(shutdown).await?;
    Ok(())
}
