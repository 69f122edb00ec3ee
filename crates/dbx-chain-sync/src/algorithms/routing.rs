//! # Block Routing
//!
//! Maps a chain identifier to the decoder for its kind. The mapping is
//! total: anything that is not one of the three distinguished chains is a
//! generic-entry chain.

use shared_types::Hash;

use super::{decode_admin_block, decode_credit_block, decode_entry_block, decode_value_transfer_block};
use crate::domain::{
    BlockKind, DecodeError, UnifiedBlockRecord, ADMINISTRATIVE_CHAIN_ID, CREDIT_CHAIN_ID,
    VALUE_TRANSFER_CHAIN_ID,
};

/// Kind of the sub-blocks carried by `chain_id`.
pub fn classify(chain_id: &Hash) -> BlockKind {
    match *chain_id {
        ADMINISTRATIVE_CHAIN_ID => BlockKind::Administrative,
        CREDIT_CHAIN_ID => BlockKind::Credit,
        VALUE_TRANSFER_CHAIN_ID => BlockKind::ValueTransfer,
        _ => BlockKind::GenericEntry,
    }
}

/// Decode `raw` with the decoder for `chain_id`.
///
/// `block_time` is the containing directory block's formatted timestamp,
/// inherited by every kind except value-transfer.
pub fn decode_block(
    chain_id: Hash,
    identifier: Hash,
    raw: &[u8],
    block_time: &str,
) -> Result<UnifiedBlockRecord, DecodeError> {
    match classify(&chain_id) {
        BlockKind::Administrative => decode_admin_block(identifier, raw, block_time),
        BlockKind::Credit => decode_credit_block(identifier, raw, block_time),
        BlockKind::ValueTransfer => decode_value_transfer_block(identifier, raw),
        BlockKind::GenericEntry => decode_entry_block(chain_id, identifier, raw, block_time),
    }
}
