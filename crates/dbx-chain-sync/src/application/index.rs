//! # Block Index
//!
//! In-memory cache store: directory blocks by identifier and by height,
//! decoded sub-blocks by identifier, and the sync progress.
//!
//! All state sits behind one `RwLock`. Readers get owned clones, so a
//! directory block is either fully visible (with its height mapping and the
//! progress update) or not at all.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use shared_types::Hash;

use crate::domain::{DirectoryBlockRecord, ExplorerError, SyncProgress, UnifiedBlockRecord};

#[derive(Default)]
struct IndexState {
    directory_blocks: HashMap<Hash, DirectoryBlockRecord>,
    heights: BTreeMap<u64, Hash>,
    blocks: HashMap<Hash, UnifiedBlockRecord>,
    progress: SyncProgress,
}

/// Cache store shared by the sync service and the decode dispatcher.
///
/// Writes are crate-private: only a walk mutates the index.
#[derive(Default)]
pub struct BlockIndex {
    state: RwLock<IndexState>,
}

impl BlockIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory block by identifier.
    pub fn directory_block(&self, identifier: &Hash) -> Result<DirectoryBlockRecord, ExplorerError> {
        self.state
            .read()
            .directory_blocks
            .get(identifier)
            .cloned()
            .ok_or_else(|| ExplorerError::directory_block_not_found(identifier))
    }

    /// Directory block by sequence height.
    pub fn directory_block_by_height(&self, height: u64) -> Result<DirectoryBlockRecord, ExplorerError> {
        let state = self.state.read();
        state
            .heights
            .get(&height)
            .and_then(|id| state.directory_blocks.get(id))
            .cloned()
            .ok_or_else(|| ExplorerError::height_not_found(height))
    }

    /// Directory blocks with `start <= height < end`, ascending by height.
    pub fn directory_blocks_in_range(&self, start: u64, end: u64) -> Vec<DirectoryBlockRecord> {
        if start >= end {
            return Vec::new();
        }
        let state = self.state.read();
        state
            .heights
            .range(start..end)
            .filter_map(|(_, id)| state.directory_blocks.get(id).cloned())
            .collect()
    }

    /// Decoded sub-block by its own identifier.
    pub fn block(&self, identifier: &Hash) -> Result<UnifiedBlockRecord, ExplorerError> {
        self.state
            .read()
            .blocks
            .get(identifier)
            .cloned()
            .ok_or_else(|| ExplorerError::block_not_found(identifier))
    }

    /// Height and previous-link of a cached directory block, `None` if not cached.
    pub fn link_of(&self, identifier: &Hash) -> Option<(u64, Hash)> {
        self.state
            .read()
            .directory_blocks
            .get(identifier)
            .map(|record| (record.sequence_height, record.previous_identifier))
    }

    /// Is every directory block from `height` down to genesis cached?
    pub fn is_synchronized_through(&self, height: u64) -> bool {
        let state = self.state.read();
        state.progress.fully_synchronized
            && state
                .progress
                .synchronized_height
                .is_some_and(|top| height <= top)
    }

    /// Snapshot of the sync progress.
    pub fn progress(&self) -> SyncProgress {
        self.state.read().progress.clone()
    }

    /// Highest committed sequence height.
    pub fn height(&self) -> u64 {
        self.state.read().progress.highest_known_height
    }

    /// Has any walk reached genesis?
    pub fn is_fully_synchronized(&self) -> bool {
        self.state.read().progress.fully_synchronized
    }

    /// Number of cached directory blocks.
    pub fn directory_block_count(&self) -> usize {
        self.state.read().directory_blocks.len()
    }

    /// Number of cached sub-blocks.
    pub fn block_count(&self) -> usize {
        self.state.read().blocks.len()
    }

    pub(crate) fn insert_block(&self, block: UnifiedBlockRecord) {
        self.state.write().blocks.insert(block.identifier, block);
    }

    /// Publish a directory block, its height mapping and the progress update
    /// under a single write lock.
    pub(crate) fn commit(&self, record: DirectoryBlockRecord) {
        let mut state = self.state.write();
        let height = record.sequence_height;
        let identifier = record.identifier;

        state.heights.insert(height, identifier);
        state.directory_blocks.insert(identifier, record);

        let progress = &mut state.progress;
        if height >= progress.highest_known_height {
            progress.highest_known_height = height;
            progress.last_known_identifier = identifier;
        }
    }

    /// Record that a walk reached genesis, or an already synchronized block,
    /// without a gap below `top` (the first height it met).
    pub(crate) fn mark_synchronized_through(&self, top: Option<u64>) {
        let progress = &mut self.state.write().progress;
        progress.fully_synchronized = true;
        if let Some(top) = top {
            progress.synchronized_height = progress.synchronized_height.max(Some(top));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockKind, DirectoryBlockHeader, GENESIS_SENTINEL};

    fn record(height: u64) -> DirectoryBlockRecord {
        let header = DirectoryBlockHeader {
            sequence_height: height,
            timestamp: 0,
            previous_identifier: if height == 1 {
                GENESIS_SENTINEL
            } else {
                Hash::with_last_byte((height - 1) as u8)
            },
            sub_block_refs: vec![],
        };
        DirectoryBlockRecord::from_header(Hash::with_last_byte(height as u8), &header)
    }

    #[test]
    fn test_lookups_miss_with_not_found() {
        let index = BlockIndex::new();
        assert!(index.directory_block(&Hash::with_last_byte(1)).unwrap_err().is_not_found());
        assert!(index.directory_block_by_height(1).unwrap_err().is_not_found());
        assert!(index.block(&Hash::with_last_byte(1)).unwrap_err().is_not_found());
        assert!(index.directory_blocks_in_range(0, 10).is_empty());
    }

    #[test]
    fn test_commit_indexes_by_identifier_and_height() {
        let index = BlockIndex::new();
        index.commit(record(2));

        assert_eq!(index.directory_block(&Hash::with_last_byte(2)).unwrap().sequence_height, 2);
        assert_eq!(index.directory_block_by_height(2).unwrap().identifier, Hash::with_last_byte(2));
        assert_eq!(
            index.link_of(&Hash::with_last_byte(2)),
            Some((2, Hash::with_last_byte(1)))
        );
        assert_eq!(index.link_of(&Hash::with_last_byte(1)), None);
        assert_eq!(index.height(), 2);
        assert_eq!(index.progress().last_known_identifier, Hash::with_last_byte(2));
    }

    #[test]
    fn test_walking_down_keeps_highest_identifier() {
        let index = BlockIndex::new();
        index.commit(record(3));
        index.commit(record(2));
        index.commit(record(1));

        let progress = index.progress();
        assert_eq!(progress.highest_known_height, 3);
        assert_eq!(progress.last_known_identifier, Hash::with_last_byte(3));
        assert!(!progress.fully_synchronized);
    }

    #[test]
    fn test_range_is_ascending_and_skips_gaps() {
        let index = BlockIndex::new();
        index.commit(record(5));
        index.commit(record(2));
        index.commit(record(3));

        let heights: Vec<u64> = index
            .directory_blocks_in_range(0, 5)
            .iter()
            .map(|r| r.sequence_height)
            .collect();
        assert_eq!(heights, vec![2, 3]);
        assert!(index.directory_blocks_in_range(4, 4).is_empty());
        assert!(index.directory_blocks_in_range(6, 1).is_empty());
    }

    #[test]
    fn test_blocks_keyed_by_own_identifier() {
        let index = BlockIndex::new();
        let chain = Hash::new([0x42; 32]);
        let block = UnifiedBlockRecord::empty(BlockKind::GenericEntry, chain, Hash::with_last_byte(9));
        index.insert_block(block.clone());

        assert_eq!(index.block(&Hash::with_last_byte(9)).unwrap(), block);
        assert!(index.block(&chain).is_err());
        assert_eq!(index.block_count(), 1);
    }

    #[test]
    fn test_empty_chain_synchronized_without_frontier() {
        let index = BlockIndex::new();
        index.mark_synchronized_through(None);
        assert!(index.is_fully_synchronized());
        assert_eq!(index.progress().synchronized_height, None);
        assert!(!index.is_synchronized_through(0));
    }

    #[test]
    fn test_frontier_only_rises() {
        let index = BlockIndex::new();
        for height in [3, 2, 1] {
            index.commit(record(height));
        }
        assert!(!index.is_synchronized_through(1));

        index.mark_synchronized_through(Some(3));
        assert!(index.is_synchronized_through(3));
        assert!(!index.is_synchronized_through(4));

        index.mark_synchronized_through(Some(2));
        assert_eq!(index.progress().synchronized_height, Some(3));

        index.commit(record(5));
        assert!(!index.is_synchronized_through(5));
        assert_eq!(index.height(), 5);
    }
}
