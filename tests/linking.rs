//! Cross-process linking: an owner and a client sharing one edge.

use reqwest::StatusCode;
use shared_edge::link::{outcome_status, LinkError};
use shared_edge::{EdgeHost, Role};

mod common;

#[tokio::test]
async fn test_client_link_lands_in_owner_registry() {
    let port = 28301;
    let owner = common::start_owner(common::edge_config(port)).await;

    let client = EdgeHost::create(common::edge_config(port), common::test_catalog())
        .await
        .unwrap();
    assert_eq!(client.role(), Role::Client);

    client.link_file("hello", "hello.toml").await.unwrap();

    assert_eq!(
        owner.linker.registry().get("hello").unwrap(),
        common::fixtures().join("hello.toml")
    );
    assert!(client.linker().registry().is_empty());

    let response = reqwest::get(format!("{}/hello", common::base_url(port))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "hello");

    owner.stop().await;
}

#[tokio::test]
async fn test_duplicate_name_relays_conflict() {
    let port = 28302;
    let owner = common::start_owner(common::edge_config(port)).await;
    owner.linker.link_file("hello", "hello.toml").await.unwrap();

    let client = EdgeHost::create(common::edge_config(port), common::test_catalog())
        .await
        .unwrap();
    let err = client.link_file("hello", "greeter.toml").await.unwrap_err();

    assert!(matches!(err, LinkError::Upstream(status) if status == StatusCode::CONFLICT), "{err}");
    assert_eq!(owner.linker.registry().len(), 1);
    assert_eq!(
        owner.linker.registry().get("hello").unwrap(),
        common::fixtures().join("hello.toml")
    );

    owner.stop().await;
}

#[tokio::test]
async fn test_client_link_all_reports_each_outcome() {
    let port = 28303;
    let owner = common::start_owner(common::edge_config(port)).await;

    let client = EdgeHost::create(common::edge_config(port), common::test_catalog())
        .await
        .unwrap();
    let outcomes = client
        .link_all([
            ("greeter", "greeter.toml"),
            ("ghost", "ghost.toml"),
            ("hello", "hello.toml"),
            ("broken", "unknown-entry.toml"),
        ])
        .await;

    let statuses: Vec<u16> = outcomes.iter().map(|o| outcome_status(o).as_u16()).collect();
    assert_eq!(statuses, vec![201, 404, 201, 500]);
    assert_eq!(
        owner.linker.registry().names(),
        vec!["greeter".to_string(), "hello".to_string()]
    );

    owner.stop().await;
}

#[tokio::test]
async fn test_concurrent_same_name_links_yield_one_winner() {
    let port = 28304;
    let owner = common::start_owner(common::edge_config(port)).await;

    let client = EdgeHost::create(common::edge_config(port), common::test_catalog())
        .await
        .unwrap();
    let outcomes = client
        .link_all([
            ("shared", "hello.toml"),
            ("shared", "hello.toml"),
            ("shared", "hello.toml"),
        ])
        .await;

    let mut statuses: Vec<u16> = outcomes.iter().map(|o| outcome_status(o).as_u16()).collect();
    statuses.sort_unstable();
    assert_eq!(statuses, vec![201, 409, 409]);
    assert_eq!(owner.linker.registry().len(), 1);

    owner.stop().await;
}

#[tokio::test]
async fn test_builtin_status_module() {
    let port = 28305;
    let mut config = common::edge_config(port);
    config.link.base_dir = Some(std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")));

    let mut host = EdgeHost::create(config, shared_edge::builtin::catalog()).await.unwrap();
    host.configure();
    host.link_file("status", "modules/status.toml").await.unwrap();

    let shutdown = shared_edge::Shutdown::new();
    let signal = shutdown.clone();
    let task = tokio::spawn(async move { host.listen(&signal).await });
    common::wait_until_listening(port).await;

    let body: serde_json::Value = reqwest::get(format!("{}/status", common::base_url(port)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["role"], "server");

    shutdown.trigger();
    task.await.unwrap().unwrap();
}
