//! S3 gateway proxy entry point.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 S3 GATEWAY                    │
//!                         │                                               │
//!     Client Request      │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!     ────────────────────┼─▶│  http   │──▶│ routing  │──▶│ upstream  │──┼──▶ Object
//!                         │  │ server  │   │  engine  │   │ exchange  │  │    store
//!                         │  └─────────┘   └──────────┘   └─────┬─────┘  │
//!                         │                                     │        │
//!     Client Response     │  ┌──────────────────────────┐       │        │
//!     ◀───────────────────┼──│ response filter pipeline │◀──────┘        │
//!                         │  │  (error shield, …)       │                │
//!                         │  └──────────────────────────┘                │
//!                         │                                               │
//!                         │  config · observability · lifecycle           │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use s3_gateway::config::loader::load_config;
use s3_gateway::lifecycle::signals;
use s3_gateway::observability::{logging, metrics};
use s3_gateway::{HttpServer, ProxyConfig, Shutdown};

/// S3-compatible object storage gateway proxy.
#[derive(Parser, Debug)]
#[command(name = "s3-gateway", version, about)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        error_shield_default = config.filter.error_shield_enabled,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::wait_for_shutdown(shutdown.clone()));

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
