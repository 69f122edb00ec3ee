//! # Directory Block Explorer
//!
//! Entry point: load configuration, install logging, run the sync loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dbx_chain_sync::SyncService;
use dbx_runtime::{run, Cli, HttpLedgerSource, RuntimeConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn env_filter(config: &RuntimeConfig) -> Result<EnvFilter> {
    match &config.log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log level"),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RuntimeConfig::load(&cli).context("Failed to load configuration")?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(&config)?)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Directory Block Explorer v{}", dbx_chain_sync::VERSION);
    info!("  Source: {}", config.source_url);
    info!("===========================================");

    let source = HttpLedgerSource::new(&config.source_url, config.request_timeout())
        .context("Failed to create HTTP client")?;
    let service = Arc::new(SyncService::new(config.sync.clone(), Arc::new(source)));

    run(service, &config).await
}
