//! # Generic Entry Block Decoder
//!
//! ```text
//! chain_id [32] | body_mr [32] | prev_key_mr [32] | prev_full_hash [32]
//! eb_sequence u32 | db_height u32 | entry_count u32
//! body: entry_count x [32]
//! ```
//!
//! Body items are entry hashes (and minute markers); the hex form of each
//! is both the entry payload and its hash.

use shared_types::Hash;

use super::reader::ByteReader;
use crate::domain::{BlockKind, DecodeError, EntryRecord, UnifiedBlockRecord};

/// Decode an entry block of the user chain `chain_id`.
pub fn decode_entry_block(
    chain_id: Hash,
    identifier: Hash,
    raw: &[u8],
    block_time: &str,
) -> Result<UnifiedBlockRecord, DecodeError> {
    let mut r = ByteReader::new(raw, BlockKind::GenericEntry);

    r.expect_chain_id(&chain_id)?;
    let _body_mr = r.read_hash()?;
    let prev_key_mr = r.read_hash()?;
    let _prev_full_hash = r.read_hash()?;
    let _eb_sequence = r.read_u32()?;
    let _db_height = r.read_u32()?;
    let entry_count = r.read_u32()?;

    let mut entries = Vec::with_capacity(entry_count.min(1024) as usize);
    for _ in 0..entry_count {
        let entry_hash = r.read_hash()?;
        entries.push(EntryRecord {
            payload: entry_hash.to_hex(),
            timestamp: block_time.to_string(),
            hash: Some(entry_hash),
        });
    }
    r.expect_end()?;

    Ok(UnifiedBlockRecord::new(
        BlockKind::GenericEntry,
        chain_id,
        identifier,
        prev_key_mr,
        entries,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DecodeCause;
    use crate::test_utils::encode_entry_block;

    const BLOCK_TIME: &str = "2015-09-20 17:00:00";

    fn user_chain() -> Hash {
        Hash::new([0x5a; 32])
    }

    #[test]
    fn test_decode_entry_block_payload_doubles_as_hash() {
        let prev = Hash::with_last_byte(0x44);
        let items = [Hash::new([1; 32]), Hash::with_last_byte(1), Hash::new([2; 32])];
        let raw = encode_entry_block(user_chain(), prev, &items);

        let block = decode_entry_block(user_chain(), Hash::with_last_byte(4), &raw, BLOCK_TIME).unwrap();
        assert_eq!(block.kind, BlockKind::GenericEntry);
        assert_eq!(block.chain_identifier, user_chain());
        assert_eq!(block.previous_identifier, prev);
        assert_eq!(block.entries.len(), 3);
        for (entry, item) in block.entries.iter().zip(&items) {
            assert_eq!(entry.payload, item.to_hex());
            assert_eq!(entry.hash, Some(*item));
            assert_eq!(entry.timestamp, BLOCK_TIME);
        }
    }

    #[test]
    fn test_decode_entry_block_chain_mismatch() {
        let raw = encode_entry_block(user_chain(), Hash::ZERO, &[]);
        let err = decode_entry_block(Hash::new([0x6b; 32]), Hash::with_last_byte(4), &raw, BLOCK_TIME)
            .unwrap_err();
        assert_eq!(err.kind, BlockKind::GenericEntry);
        assert!(matches!(err.cause, DecodeCause::ChainIdMismatch { .. }));
    }

    #[test]
    fn test_decode_entry_block_short_body() {
        let raw = encode_entry_block(user_chain(), Hash::ZERO, &[Hash::new([1; 32])]);
        let err = decode_entry_block(user_chain(), Hash::with_last_byte(4), &raw[..raw.len() - 1], BLOCK_TIME)
            .unwrap_err();
        assert!(matches!(err.cause, DecodeCause::UnexpectedEof { .. }));
    }
}
