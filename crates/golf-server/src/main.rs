//! # Golf Server
//!
//! Realtime server for multiplayer golf sessions.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! golf
//!
//! # Run with a specific config file
//! golf --config /path/to/golf.toml
//!
//! # Override settings from the environment
//! GOLF_PORT=8080 GOLF_GAME__REPORT_ERRORS=true golf
//! ```

mod cli;
mod config;
mod handlers;
mod metrics;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "golf=debug,golf_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &args.config {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load()?,
    };

    tracing::info!("Starting golf server on {}:{}", config.host, config.port);

    metrics::init_metrics();

    handlers::run_server(config).await?;

    Ok(())
}
