//! Modules compiled into the `shared-edge` binary.

use axum::{extract::State, routing::get, Json};
use serde::Serialize;

use crate::health::Role;
use crate::link::ModuleCatalog;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub version: &'static str,
    pub role: String,
}

async fn get_status(State(role): State<Role>) -> Json<StatusReport> {
    Json(StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        role: role.to_string(),
    })
}

/// Catalog with the `status` entry point, which mounts `GET /status`.
pub fn catalog() -> ModuleCatalog {
    ModuleCatalog::new().register("status", |host| {
        host.route("/status", get(get_status).with_state(host.role()))
    })
}
