//! sync-relay
//!
//! Pulls sports data from rate-limited upstream APIs on fixed cadences and
//! pushes changes to WebSocket subscribers.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌────────────────────────────── SYNC RELAY ──────────────────────────────┐
//!   │                                                                         │
//!   │  scheduler ──tick──▶ sync workers ──fetch──▶ upstream coordinator ──────┼──▶ MLB / ESPN
//!   │                          │   ▲                (rate window, circuit,    │
//!   │                          │   │                 retry with backoff)      │
//!   │                          │   └── stale fallback ── cache layer          │
//!   │                          │                                              │
//!   │                          ├──upsert──▶ record store                      │
//!   │                          └──publish─▶ event bus ──▶ dispatcher          │
//!   │                                                         │               │
//!   │  subscribers ◀──ws──  connection manager ◀──────────────┘               │
//!   │                        (heartbeat, subscription registry)               │
//!   └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use sync_relay::config::{load_config, RelayConfig};
use sync_relay::lifecycle::{wait_for_signal, RelayRuntime, Shutdown};
use sync_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "sync-relay", version, about = "Sports data sync and live update relay")]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sync-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        sources = config.sources.len(),
        max_connections = config.listener.max_connections,
        heartbeat_secs = config.distribution.heartbeat_secs,
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

    let runtime = RelayRuntime::build(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    runtime.run(listener, shutdown).await?;
    Ok(())
}
