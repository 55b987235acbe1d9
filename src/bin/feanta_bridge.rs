//! FEANTA gateway daemon.
//!
//! Listens for ACC command lines and forwards them to the Brick, BB and PDU.
//!
//! # Usage
//!
//! ```bash
//! # Serve with deployed defaults
//! feanta-bridge serve
//!
//! # Override the listener port and load device settings from a file
//! feanta-bridge serve --config feanta.json --port 6000
//!
//! # Poll telemetry once and print it as JSON
//! feanta-bridge stateframe --config feanta.json
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feanta_bridge::bb::BbWorker;
use feanta_bridge::brick::BrickWorker;
use feanta_bridge::pdu::PduWorker;
use feanta_bridge::{Config, Journal, Listener, WorkerRegistry};

#[derive(Parser)]
#[command(name = "feanta-bridge")]
#[command(version)]
#[command(about = "Command gateway between the ACC and the FEANTA hardware")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept ACC commands until killed
    Serve {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Listener port, overrides the configuration
        #[arg(long)]
        port: Option<u16>,
    },
    /// Poll every device once and print the merged stateframe
    Stateframe {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Registry with every device worker, in stateframe order.
fn build_registry(config: &Config) -> Result<WorkerRegistry> {
    let registry = WorkerRegistry::new(Journal::default())
        .with_worker(PduWorker::from_config(config.pdu.clone()))?
        .with_worker(BrickWorker::from_config(config.brick.clone()))?
        .with_worker(BbWorker::from_config(config.bb.clone()))?;
    Ok(registry)
}

fn serve(config: Config) -> Result<()> {
    let registry = build_registry(&config).context("registering workers")?;
    log::info!("Registered commands: {}", registry.command_names().join(", "));

    let mut listener =
        Listener::bind(&config.listener, registry).context("binding ACC listener")?;
    listener.serve()
}

fn stateframe(config: Config) -> Result<()> {
    let mut registry = build_registry(&config).context("registering workers")?;
    let frame = registry.stateframe();
    if frame.decode_failures > 0 {
        log::warn!("{} telemetry values defaulted to zero", frame.decode_failures);
    }
    println!("{}", serde_json::to_string_pretty(&frame)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    match Cli::parse().command {
        Commands::Serve { config, port } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(port) = port {
                config.listener = config.listener.with_port(port);
            }
            serve(config)
        }
        Commands::Stateframe { config } => stateframe(load_config(config.as_deref())?),
    }
}
