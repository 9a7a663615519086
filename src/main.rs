//! Shared edge process.
//!
//! ```text
//!   process A (first)                 process B (later)
//!   ┌──────────────────────┐          ┌──────────────────────┐
//!   │ probe: no owner      │          │ probe: A answered    │
//!   │ role = Server        │◀─────────│ role = Client        │
//!   │ listener + registry  │ POST     │ link → forward to A  │
//!   │ {internal}/check     │ /link    │ no listener          │
//!   │ {internal}/link      │          │                      │
//!   └──────────────────────┘          └──────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use shared_edge::config::{load_config, ServerConfig};
use shared_edge::lifecycle::{self, signals, Shutdown, StartupLink};
use shared_edge::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "shared-edge")]
#[command(about = "Shared HTTP(S) edge for independently deployed modules", long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Module to link at startup, as name=path. Repeatable.
    #[arg(short, long = "link", value_name = "NAME=PATH")]
    links: Vec<StartupLink>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "shared-edge starting");
    tracing::info!(
        is_production = config.is_production,
        local_port = config.local_port,
        internal_path = %config.internal_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    match lifecycle::run(config, shared_edge::builtin::catalog(), &cli.links, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
