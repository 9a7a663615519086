use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use shared_edge::config::{load_config, ServerConfig};
use shared_edge::health::HostProbe;
use shared_edge::link::{forward::Forwarder, outcome_status, LinkRequest, Resolver};
use shared_edge::net::Endpoint;

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Talk to the process owning the shared edge on this machine", long_about = None)]
struct Cli {
    /// Edge config; the owner's endpoint is derived from it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe for an owner and print the role a new process would take
    Check,
    /// Link a module on the owner
    Link {
        /// Registry name of the module
        name: String,
        /// Path to the module manifest
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    let endpoint = Endpoint::from_config(&config);
    let client = HostProbe::loopback_client(Duration::from_millis(config.probe.timeout_ms))?;

    match cli.command {
        Commands::Check => {
            let probe = HostProbe::new(client, endpoint.clone(), config.internal_path.clone());
            let outcome = probe.probe().await;
            println!("endpoint: {endpoint}");
            println!("outcome:  {outcome:?}");
            println!("role:     {}", outcome.role());
        }
        Commands::Link { name, path } => {
            let resolver = Resolver::new(std::env::current_dir()?);
            let resolved = match resolver.resolve(&path).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            };

            let forwarder = Forwarder::new(client, endpoint, config.internal_path.clone(), config.link.clone());
            let outcome = forwarder
                .forward(&LinkRequest {
                    name,
                    path: resolved.to_string_lossy().into_owned(),
                })
                .await;

            let status = outcome_status(&outcome);
            match outcome {
                Ok(()) => println!("{status}"),
                Err(e) => {
                    eprintln!("Error: {e} ({status})");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
