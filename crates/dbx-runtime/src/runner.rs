//! Periodic sync loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use dbx_chain_sync::{ExplorerApi, ExplorerError, LedgerSource, SyncReport, SyncService};
use tracing::{info, warn};

use crate::config::RuntimeConfig;

/// Run one walk and log the index status afterwards, whatever the outcome.
pub async fn sync_once<S: LedgerSource + 'static>(
    service: &SyncService<S>,
) -> Result<SyncReport, ExplorerError> {
    let result = service.synchronize().await;
    let index = service.index();
    info!(
        "[dbx] Status: height={} synchronized={} directory_blocks={} sub_blocks={}",
        index.height(),
        index.is_fully_synchronized(),
        index.directory_block_count(),
        index.block_count()
    );
    result
}

/// Walk now, then on every tick until Ctrl+C.
///
/// With `run_once` the first walk's failure is returned; otherwise failures
/// are logged and the walk is retried at the next tick.
pub async fn run<S: LedgerSource + 'static>(
    service: Arc<SyncService<S>>,
    config: &RuntimeConfig,
) -> Result<()> {
    if config.run_once {
        sync_once(&service).await.context("Sync failed")?;
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.sync_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        "[dbx] Syncing from {} every {}s. Press Ctrl+C to stop.",
        service.source().source_id(),
        config.sync_interval_secs
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = sync_once(&service).await {
                    warn!("[dbx] Walk failed, retrying in {}s: {}", config.sync_interval_secs, e);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                info!("[dbx] Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
