//! # Inbound Ports
//!
//! API trait defining what the explorer exposes to its callers.

use async_trait::async_trait;
use shared_types::Hash;

use crate::domain::{
    DirectoryBlockRecord, ExplorerError, SyncProgress, SyncReport, UnifiedBlockRecord,
};

/// Explorer API - inbound port.
///
/// Lookups never touch the ledger source. A miss is
/// [`ExplorerError::NotFound`].
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// Walk from the source's head toward genesis, committing every
    /// directory block not yet cached.
    ///
    /// Fails with `Source` or `Decode`; blocks committed before the failure
    /// stay cached and the next call resumes below them.
    async fn synchronize(&self) -> Result<SyncReport, ExplorerError>;

    /// Directory block by identifier.
    fn directory_block(&self, identifier: &Hash) -> Result<DirectoryBlockRecord, ExplorerError>;

    /// Directory block by sequence height.
    fn directory_block_by_height(&self, height: u64)
        -> Result<DirectoryBlockRecord, ExplorerError>;

    /// Directory blocks with `start <= height < end`, ascending.
    /// Unpopulated heights are skipped.
    fn directory_blocks_in_range(&self, start: u64, end: u64) -> Vec<DirectoryBlockRecord>;

    /// Decoded sub-block by its own identifier.
    fn block(&self, identifier: &Hash) -> Result<UnifiedBlockRecord, ExplorerError>;

    /// Highest committed sequence height.
    fn height(&self) -> u64;

    /// Has any walk reached genesis?
    fn is_fully_synchronized(&self) -> bool;

    /// Snapshot of the sync progress.
    fn progress(&self) -> SyncProgress;
}
