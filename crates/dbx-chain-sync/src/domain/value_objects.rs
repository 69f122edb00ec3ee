//! # Domain Value Objects
//!
//! Immutable value types for directory block sync.

use serde::{Deserialize, Serialize};
use shared_types::Hash;
use std::fmt;

/// Kind of a sub-block, decided by its chain identifier.
///
/// Exactly one kind applies to every decoded sub-block.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    /// Administrative chain (`...0a`).
    Administrative,
    /// Entry credit chain (`...0c`).
    Credit,
    /// Value-transfer (factoid) chain (`...0f`).
    ValueTransfer,
    /// Any other chain.
    GenericEntry,
}

impl BlockKind {
    /// All kinds in canonical order.
    pub const ALL: [BlockKind; 4] = [
        BlockKind::Administrative,
        BlockKind::Credit,
        BlockKind::ValueTransfer,
        BlockKind::GenericEntry,
    ];

    /// Whether a directory block retains the decoded record for this kind.
    pub fn is_distinguished(&self) -> bool {
        !matches!(self, BlockKind::GenericEntry)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Administrative => "administrative",
            BlockKind::Credit => "credit",
            BlockKind::ValueTransfer => "value-transfer",
            BlockKind::GenericEntry => "generic-entry",
        };
        f.write_str(name)
    }
}

/// Aggregated entry counts per sub-block kind.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntryCounts {
    /// Entries in administrative sub-blocks.
    pub administrative: usize,
    /// Entries in credit sub-blocks.
    pub credit: usize,
    /// Entries in value-transfer sub-blocks.
    pub value_transfer: usize,
    /// Entries in generic-entry sub-blocks.
    pub generic_entry: usize,
}

impl EntryCounts {
    /// Add `count` entries to the bucket for `kind`.
    pub fn add(&mut self, kind: BlockKind, count: usize) {
        match kind {
            BlockKind::Administrative => self.administrative += count,
            BlockKind::Credit => self.credit += count,
            BlockKind::ValueTransfer => self.value_transfer += count,
            BlockKind::GenericEntry => self.generic_entry += count,
        }
    }

    /// Count for one kind.
    pub fn get(&self, kind: BlockKind) -> usize {
        match kind {
            BlockKind::Administrative => self.administrative,
            BlockKind::Credit => self.credit,
            BlockKind::ValueTransfer => self.value_transfer,
            BlockKind::GenericEntry => self.generic_entry,
        }
    }

    /// Sum over all kinds.
    pub fn total(&self) -> usize {
        self.administrative + self.credit + self.value_transfer + self.generic_entry
    }
}

/// Reference from a directory block to one of its sub-blocks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubBlockRef {
    /// Chain the sub-block belongs to.
    pub chain_id: Hash,
    /// The sub-block's own identifier (KeyMR).
    pub identifier: Hash,
}

impl SubBlockRef {
    /// Create a new reference.
    pub fn new(chain_id: Hash, identifier: Hash) -> Self {
        Self {
            chain_id,
            identifier,
        }
    }
}

/// Directory block header as served by the ledger source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryBlockHeader {
    /// Sequence height.
    pub sequence_height: u64,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Link to the previous directory block.
    pub previous_identifier: Hash,
    /// Sub-block references in source order.
    pub sub_block_refs: Vec<SubBlockRef>,
}

/// Result of a [`synchronize`](crate::ports::ExplorerApi::synchronize) call.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncReport {
    /// Directory blocks fetched, decoded and committed by this walk.
    pub blocks_committed: u64,
    /// Cached directory blocks stepped over without re-fetching.
    pub blocks_skipped: u64,
    /// Sub-blocks decoded by this walk.
    pub sub_blocks_decoded: u64,
    /// Did this walk reach the genesis sentinel?
    pub reached_genesis: bool,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_counts_add_and_total() {
        let mut counts = EntryCounts::default();
        counts.add(BlockKind::Administrative, 3);
        counts.add(BlockKind::GenericEntry, 2);
        counts.add(BlockKind::GenericEntry, 5);

        assert_eq!(counts.get(BlockKind::Administrative), 3);
        assert_eq!(counts.get(BlockKind::GenericEntry), 7);
        assert_eq!(counts.get(BlockKind::Credit), 0);
        assert_eq!(counts.total(), 10);
    }

    #[test]
    fn test_block_kind_display() {
        assert_eq!(BlockKind::ValueTransfer.to_string(), "value-transfer");
        assert_eq!(BlockKind::GenericEntry.to_string(), "generic-entry");
    }

    #[test]
    fn test_only_generic_entry_is_not_distinguished() {
        let distinguished: Vec<_> = BlockKind::ALL
            .iter()
            .filter(|k| k.is_distinguished())
            .collect();
        assert_eq!(distinguished.len(), 3);
        assert!(!BlockKind::GenericEntry.is_distinguished());
    }

    #[test]
    fn test_block_kind_serializes_camel_case() {
        let json = serde_json::to_string(&BlockKind::ValueTransfer).unwrap();
        assert_eq!(json, "\"valueTransfer\"");
    }
}
