//! # Domain Invariants
//!
//! Well-known identifiers and rules that must always hold for the index.

use chrono::DateTime;
use shared_types::Hash;

use super::entities::DirectoryBlockRecord;
use super::value_objects::BlockKind;

/// Previous-link of the first directory block. Never a real block.
pub const GENESIS_SENTINEL: Hash = Hash::ZERO;

/// Administrative chain identifier (`...0a`).
pub const ADMINISTRATIVE_CHAIN_ID: Hash = Hash::with_last_byte(0x0a);

/// Entry credit chain identifier (`...0c`).
pub const CREDIT_CHAIN_ID: Hash = Hash::with_last_byte(0x0c);

/// Value-transfer chain identifier (`...0f`).
pub const VALUE_TRANSFER_CHAIN_ID: Hash = Hash::with_last_byte(0x0f);

/// Rendering of block and entry timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format Unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Values chrono cannot represent fall back to the raw number.
pub fn format_timestamp(unix_secs: u64) -> String {
    i64::try_from(unix_secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}

/// Invariant: a cursor equal to the sentinel ends the walk.
pub fn is_genesis_sentinel(identifier: &Hash) -> bool {
    *identifier == GENESIS_SENTINEL
}

/// Invariant: every populated distinguished slot agrees with its count bucket.
///
/// Holds whenever a directory block references at most one sub-block of each
/// distinguished kind, which is the ledger's rule.
pub fn invariant_counts_match_slots(record: &DirectoryBlockRecord) -> bool {
    [
        BlockKind::Administrative,
        BlockKind::Credit,
        BlockKind::ValueTransfer,
    ]
    .into_iter()
    .all(|kind| match record.sub_blocks.get(kind) {
        Some(block) => block.entries.len() == record.entry_counts.get(kind),
        None => true,
    })
}

/// Invariant: `child` directly follows `parent` in the chain.
pub fn invariant_linked(child: &DirectoryBlockRecord, parent: &DirectoryBlockRecord) -> bool {
    child.previous_identifier == parent.identifier
        && child.sequence_height == parent.sequence_height + 1
}
