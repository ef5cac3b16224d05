//! Agent dispatch gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /process
//!     ─────────────▶ http server ──▶ classifier ──▶ dispatcher
//!                                                       │
//!                                      router: intent → target
//!                                                       │
//!                                      breaker registry: target → breaker
//!                                                       │
//!                                  ┌────────────────────┴───────────────────┐
//!                                  ▼ urgent                                 ▼ otherwise
//!                           HTTP worker call                       durable "<target>_queue"
//! ```
//!
//! Config file changes swap the routing table in place; SIGTERM/Ctrl-C
//! drains in-flight requests and exits.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use agent_dispatch::config::{load_config, watcher::ConfigWatcher, GatewayConfig};
use agent_dispatch::lifecycle::{shutdown_signal, Shutdown};
use agent_dispatch::observability::{logging, metrics};
use agent_dispatch::HttpServer;

#[derive(Parser)]
#[command(name = "agent-dispatch")]
#[command(about = "Routes classified requests to worker agents", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "AGENT_DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "agent-dispatch starting");
    tracing::info!(
        service = %config.service.name,
        bind_address = %config.listener.bind_address,
        routes = config.routing.routes.len(),
        default_target = %config.routing.default_target,
        failure_threshold = config.breaker.failure_threshold,
        open_timeout_secs = config.breaker.open_timeout_secs,
        recovery_threshold = config.breaker.recovery_threshold,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server for events to keep flowing.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (rx, Some(watcher.run()?))
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.trigger();
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
