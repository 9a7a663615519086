//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use shared_edge::link::Linker;
use shared_edge::{EdgeHost, ModuleCatalog, Role, ServerConfig, Shutdown};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

pub fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Non-production config on `port`, bound to loopback, resolving modules
/// from the fixtures directory.
pub fn edge_config(port: u16) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.local_port = port;
    config.transport.bind_host = "127.0.0.1".into();
    config.probe.timeout_ms = 500;
    config.link.base_dir = Some(fixtures());
    config.link.retry_base_delay_ms = 10;
    config
}

/// Entry points named by the fixture manifests.
pub fn test_catalog() -> ModuleCatalog {
    ModuleCatalog::new()
        .register("hello", |host| host.route("/hello", get(|| async { "hello" })))
        .register("greeter", |host| {
            host.route("/greet", get(|| async { "greetings" }))
        })
}

pub struct Owner {
    pub linker: Arc<Linker>,
    pub shutdown: Shutdown,
    pub task: JoinHandle<()>,
}

impl Owner {
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.task).await;
    }
}

/// Start an owning process on `config.local_port` and wait until it accepts
/// connections.
pub async fn start_owner(config: ServerConfig) -> Owner {
    let port = config.local_port;
    let mut host = EdgeHost::create(config, test_catalog()).await.unwrap();
    assert_eq!(host.role(), Role::Server, "port {port} already owned");
    host.configure();

    let linker = host.linker().clone();
    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    let task = tokio::spawn(async move {
        if let Err(e) = host.listen(&signal).await {
            panic!("owner failed: {e}");
        }
    });

    wait_until_listening(port).await;
    Owner {
        linker,
        shutdown,
        task,
    }
}

pub async fn wait_until_listening(port: u16) {
    for _ in 0..100 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing listening on port {port}");
}

pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}
