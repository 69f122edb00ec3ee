//! # Domain Entities
//!
//! Records held by the block index: directory blocks, decoded sub-blocks
//! normalized into one shape, and the process-wide sync progress.

use serde::{Deserialize, Serialize};
use shared_types::Hash;

use super::invariants::{format_timestamp, GENESIS_SENTINEL};
use super::value_objects::{BlockKind, DirectoryBlockHeader, EntryCounts, SubBlockRef};

/// One decoded item inside a sub-block.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryRecord {
    /// Hex bytes, or the transaction's canonical string for value-transfer entries.
    pub payload: String,
    /// Formatted timestamp.
    pub timestamp: String,
    /// Independent entry hash, if the kind carries one.
    pub hash: Option<Hash>,
}

impl EntryRecord {
    /// Entry without its own hash.
    pub fn unhashed(payload: String, timestamp: &str) -> Self {
        Self {
            payload,
            timestamp: timestamp.to_string(),
            hash: None,
        }
    }

    /// Entry with its own hash.
    pub fn hashed(payload: String, timestamp: String, hash: Hash) -> Self {
        Self {
            payload,
            timestamp,
            hash: Some(hash),
        }
    }
}

/// Decoded sub-block normalized into the shape shared by all kinds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedBlockRecord {
    /// Chain the block belongs to.
    pub chain_identifier: Hash,
    /// The block's own identifier.
    pub identifier: Hash,
    /// Link to the previous block in the same chain.
    pub previous_identifier: Hash,
    /// Kind, decided by chain identifier.
    pub kind: BlockKind,
    /// Decoded entries, in block order.
    pub entries: Vec<EntryRecord>,
}

impl UnifiedBlockRecord {
    /// Create a new record.
    pub fn new(
        kind: BlockKind,
        chain_identifier: Hash,
        identifier: Hash,
        previous_identifier: Hash,
        entries: Vec<EntryRecord>,
    ) -> Self {
        Self {
            chain_identifier,
            identifier,
            previous_identifier,
            kind,
            entries,
        }
    }

    /// Record with no entries and no previous link.
    pub fn empty(kind: BlockKind, chain_identifier: Hash, identifier: Hash) -> Self {
        Self::new(kind, chain_identifier, identifier, Hash::ZERO, Vec::new())
    }

    /// Number of decoded entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// The three distinguished sub-blocks retained on a directory block.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubBlocks {
    /// Administrative sub-block.
    pub administrative: Option<UnifiedBlockRecord>,
    /// Credit sub-block.
    pub credit: Option<UnifiedBlockRecord>,
    /// Value-transfer sub-block.
    pub value_transfer: Option<UnifiedBlockRecord>,
}

impl SubBlocks {
    /// Slot for `kind`, or `None` for generic-entry blocks.
    pub fn get(&self, kind: BlockKind) -> Option<&UnifiedBlockRecord> {
        match kind {
            BlockKind::Administrative => self.administrative.as_ref(),
            BlockKind::Credit => self.credit.as_ref(),
            BlockKind::ValueTransfer => self.value_transfer.as_ref(),
            BlockKind::GenericEntry => None,
        }
    }

    fn slot_mut(&mut self, kind: BlockKind) -> Option<&mut Option<UnifiedBlockRecord>> {
        match kind {
            BlockKind::Administrative => Some(&mut self.administrative),
            BlockKind::Credit => Some(&mut self.credit),
            BlockKind::ValueTransfer => Some(&mut self.value_transfer),
            BlockKind::GenericEntry => None,
        }
    }
}

/// One directory block, with its sub-blocks decoded and counted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryBlockRecord {
    /// Sequence height.
    pub sequence_height: u64,
    /// KeyMR of this directory block.
    pub identifier: Hash,
    /// Link to the previous directory block.
    pub previous_identifier: Hash,
    /// Formatted block time.
    pub timestamp: String,
    /// Entry counts per kind.
    pub entry_counts: EntryCounts,
    /// Distinguished sub-blocks.
    pub sub_blocks: SubBlocks,
    /// Every sub-block reference, in source order.
    pub sub_block_refs: Vec<SubBlockRef>,
}

impl DirectoryBlockRecord {
    /// Start a record from the source's header. Counts begin at zero.
    pub fn from_header(identifier: Hash, header: &DirectoryBlockHeader) -> Self {
        Self {
            sequence_height: header.sequence_height,
            identifier,
            previous_identifier: header.previous_identifier,
            timestamp: format_timestamp(header.timestamp),
            entry_counts: EntryCounts::default(),
            sub_blocks: SubBlocks::default(),
            sub_block_refs: header.sub_block_refs.clone(),
        }
    }

    /// Fold a decoded sub-block into counts and, for distinguished kinds, its slot.
    pub fn absorb(&mut self, block: UnifiedBlockRecord) {
        self.entry_counts.add(block.kind, block.entry_count());
        if let Some(slot) = self.sub_blocks.slot_mut(block.kind) {
            *slot = Some(block);
        }
    }

    /// True when this is the first directory block of the chain.
    pub fn is_genesis(&self) -> bool {
        self.previous_identifier == GENESIS_SENTINEL
    }
}

/// Process-wide sync progress.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    /// Highest committed sequence height.
    pub highest_known_height: u64,
    /// Has a walk ever reached the genesis sentinel?
    pub fully_synchronized: bool,
    /// Identifier of the highest committed directory block.
    pub last_known_identifier: Hash,
    /// Height through which every directory block down to genesis is cached.
    /// `None` until a walk has covered an unbroken run from genesis.
    pub synchronized_height: Option<u64>,
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self {
            highest_known_height: 0,
            fully_synchronized: false,
            last_known_identifier: GENESIS_SENTINEL,
            synchronized_height: None,
        }
    }
}
