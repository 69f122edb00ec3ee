//! # Sync Service
//!
//! Application service walking the directory block chain from the head
//! back to genesis and serving lookups from the block index.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use shared_types::Hash;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::dispatcher::DecodeDispatcher;
use super::index::BlockIndex;
use crate::config::SyncConfig;
use crate::domain::{
    is_genesis_sentinel, DirectoryBlockRecord, ExplorerError, SyncProgress, SyncReport,
    UnifiedBlockRecord,
};
use crate::ports::{ExplorerApi, LedgerSource};

/// Sync Service - orchestrates the chain walk.
pub struct SyncService<S: LedgerSource> {
    /// Configuration.
    config: SyncConfig,
    /// Remote ledger.
    source: Arc<S>,
    /// Cache store.
    index: Arc<BlockIndex>,
    /// Sub-block decoding.
    dispatcher: DecodeDispatcher,
    /// Held for the whole walk; concurrent callers queue here.
    walk_lock: Mutex<()>,
}

impl<S: LedgerSource> SyncService<S> {
    /// Create a new sync service with an empty index.
    pub fn new(config: SyncConfig, source: Arc<S>) -> Self {
        let index = Arc::new(BlockIndex::new());
        let dispatcher = DecodeDispatcher::new(index.clone(), &config);
        Self {
            config,
            source,
            index,
            dispatcher,
            walk_lock: Mutex::new(()),
        }
    }

    /// The block index.
    pub fn index(&self) -> &Arc<BlockIndex> {
        &self.index
    }

    /// The ledger source.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// The configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    async fn walk(&self) -> Result<SyncReport, ExplorerError> {
        let mut report = SyncReport::default();
        let mut cursor = self.source.get_head().await?;
        debug!("[dbx] Walking back from head {} ({})", cursor, self.source.source_id());

        // First height this walk met, and the height it met last.
        let mut top: Option<u64> = None;
        let mut last_height: Option<u64> = None;

        loop {
            if is_genesis_sentinel(&cursor) {
                self.index.mark_synchronized_through(top);
                report.reached_genesis = true;
                break;
            }

            if let Some((height, previous)) = self.index.link_of(&cursor) {
                ensure_descends(&cursor, height, last_height)?;
                if self.index.is_synchronized_through(height) {
                    debug!("[dbx] Reached synchronized block {} at height {}", cursor, height);
                    self.index.mark_synchronized_through(top);
                    break;
                }
                top.get_or_insert(height);
                last_height = Some(height);
                report.blocks_skipped += 1;
                cursor = previous;
                continue;
            }

            if let Some(max) = self.config.max_walk_depth {
                if report.blocks_committed >= max {
                    info!("[dbx] Walk depth limit {} reached at {}", max, cursor);
                    break;
                }
            }

            let record = self
                .fetch_directory_block(&cursor, last_height, &mut report)
                .await?;
            top.get_or_insert(record.sequence_height);
            last_height = Some(record.sequence_height);
            cursor = record.previous_identifier;
            self.commit(record);
            report.blocks_committed += 1;
        }

        Ok(report)
    }

    /// Fetch one directory block and decode every sub-block it references.
    ///
    /// `above` is the height of the block the walk visited just before.
    async fn fetch_directory_block(
        &self,
        identifier: &Hash,
        above: Option<u64>,
        report: &mut SyncReport,
    ) -> Result<DirectoryBlockRecord, ExplorerError> {
        let header = self.source.get_directory_block(identifier).await?;
        debug!(
            "[dbx] Fetched directory block {} at height {} ({} sub-blocks)",
            identifier,
            header.sequence_height,
            header.sub_block_refs.len()
        );

        if header.previous_identifier == *identifier {
            return Err(ExplorerError::Source(format!(
                "directory block {} links to itself",
                identifier
            )));
        }
        ensure_descends(identifier, header.sequence_height, above)?;
        if let Some((previous_height, _)) = self.index.link_of(&header.previous_identifier) {
            ensure_descends(
                &header.previous_identifier,
                previous_height,
                Some(header.sequence_height),
            )?;
        }

        let mut record = DirectoryBlockRecord::from_header(*identifier, &header);
        for sub_block in &header.sub_block_refs {
            let raw = self.source.get_raw(&sub_block.identifier).await?;
            let block = self.dispatcher.dispatch(sub_block, &raw, &record.timestamp)?;
            report.sub_blocks_decoded += 1;
            record.absorb(block);
        }
        Ok(record)
    }

    fn commit(&self, record: DirectoryBlockRecord) {
        if self.config.log_committed_blocks && tracing::enabled!(tracing::Level::DEBUG) {
            match serde_json::to_string(&record) {
                Ok(json) => debug!("[dbx] Committed {}", json),
                Err(e) => warn!("[dbx] Could not render block {}: {}", record.identifier, e),
            }
        }
        self.index.commit(record);
    }
}

/// A walk only ever moves to strictly lower heights.
fn ensure_descends(
    identifier: &Hash,
    height: u64,
    above: Option<u64>,
) -> Result<(), ExplorerError> {
    match above {
        Some(above) if height >= above => Err(ExplorerError::Source(format!(
            "directory block {} at height {} is linked from height {}",
            identifier, height, above
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl<S: LedgerSource + 'static> ExplorerApi for SyncService<S> {
    async fn synchronize(&self) -> Result<SyncReport, ExplorerError> {
        let _guard = self.walk_lock.lock().await;
        let start = Instant::now();

        match self.walk().await {
            Ok(mut report) => {
                report.duration_ms =
                    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                info!(
                    "[dbx] Sync complete: committed={} skipped={} sub_blocks={} genesis={} ({}ms)",
                    report.blocks_committed,
                    report.blocks_skipped,
                    report.sub_blocks_decoded,
                    report.reached_genesis,
                    report.duration_ms
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    "[dbx] Sync aborted after {}ms: {}",
                    start.elapsed().as_millis(),
                    e
                );
                Err(e)
            }
        }
    }

    fn directory_block(&self, identifier: &Hash) -> Result<DirectoryBlockRecord, ExplorerError> {
        self.index.directory_block(identifier)
    }

    fn directory_block_by_height(
        &self,
        height: u64,
    ) -> Result<DirectoryBlockRecord, ExplorerError> {
        self.index.directory_block_by_height(height)
    }

    fn directory_blocks_in_range(&self, start: u64, end: u64) -> Vec<DirectoryBlockRecord> {
        self.index.directory_blocks_in_range(start, end)
    }

    fn block(&self, identifier: &Hash) -> Result<UnifiedBlockRecord, ExplorerError> {
        self.index.block(identifier)
    }

    fn height(&self) -> u64 {
        self.index.height()
    }

    fn is_fully_synchronized(&self) -> bool {
        self.index.is_fully_synchronized()
    }

    fn progress(&self) -> SyncProgress {
        self.index.progress()
    }
}
