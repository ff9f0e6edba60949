//! JSON-RPC gateway
//!
//! A protective proxy in front of one or more Ethereum JSON-RPC nodes.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                   JSON-RPC GATEWAY                   │
//!                    │                                                      │
//!   Client POST /    │  ┌─────────┐    ┌───────────┐    ┌──────────────┐    │
//!   ─────────────────┼─▶│  http   │───▶│ security  │───▶│   dispatch   │────┼──▶ Upstream nodes
//!                    │  │ server  │    │ validator │    │naive/race/fb │    │    (http/ws)
//!                    │  └─────────┘    └───────────┘    └──────────────┘    │
//!   ◀────────────────┼── raw upstream bytes or JSON-RPC error               │
//!                    │                                                      │
//!                    │  ┌────────────────────────────────────────────────┐  │
//!                    │  │ config (ArcSwap snapshot, watcher, SIGHUP)     │  │
//!                    │  │ observability (tracing, prometheus)            │  │
//!                    │  │ lifecycle (signals, graceful shutdown)         │  │
//!                    │  └────────────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use jsonrpc_gateway::config::watcher::ConfigWatcher;
use jsonrpc_gateway::config::{load_config, ConfigHandle, RunningConfig};
use jsonrpc_gateway::lifecycle::{signals, Shutdown};
use jsonrpc_gateway::observability::{logging, metrics};
use jsonrpc_gateway::GatewayServer;

#[derive(Parser, Debug)]
#[command(name = "jsonrpc-gateway", version, about = "Protective JSON-RPC gateway for Ethereum nodes")]
struct Cli {
    /// Path to the configuration file (TOML, or JSON by extension)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload the configuration when the file changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("jsonrpc-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let running = RunningConfig::build(&config).map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    tracing::info!(
        strategy = %running.strategy(),
        upstreams = running.upstreams().len(),
        method_limitation = running.method_limitation_enabled(),
        allowed_methods = running.validator().allowed_method_count(),
        whitelisted_contracts = running.validator().whitelist_len(),
        "Configuration loaded"
    );

    let handle = ConfigHandle::new(running);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Reload sources (file watcher, SIGHUP) feed one channel.
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    tokio::spawn(handle.clone().apply_updates(update_rx));

    let _watcher = if cli.watch {
        match ConfigWatcher::new(&cli.config, update_tx.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start config watcher");
                None
            }
        }
    } else {
        None
    };
    tokio::spawn(signals::reload_on_sighup(cli.config.clone(), update_tx));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::trigger_on_signal(shutdown));

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    GatewayServer::new(&config, handle)
        .run(listener, server_shutdown, grace)
        .await?;

    Ok(())
}
