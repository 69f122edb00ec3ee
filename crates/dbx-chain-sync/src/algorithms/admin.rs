//! # Administrative Block Decoder
//!
//! ```text
//! chain_id [32] | prev_full_hash [32] | db_height u32
//! header_expansion_size varint | header_expansion [n]
//! message_count u32 | body_size u32 | body
//! ```
//!
//! Each body entry is a type byte followed by its payload. Types up to
//! `0x09` have fixed sizes; `0x0a..=0x0f` carry a varint length prefix.

use shared_types::Hash;

use super::reader::ByteReader;
use crate::domain::{
    BlockKind, DecodeCause, DecodeError, EntryRecord, UnifiedBlockRecord,
    ADMINISTRATIVE_CHAIN_ID,
};

/// Payload size of a fixed-size admin entry type, `None` for length-prefixed types.
fn fixed_payload_size(entry_type: u8) -> Result<Option<usize>, DecodeCause> {
    let size = match entry_type {
        0x00 => 1,   // minute number
        0x01 => 128, // directory block signature
        0x02 => 64,  // reveal matryoshka hash
        0x03 => 64,  // add/replace matryoshka hash
        0x04 => 1,   // increase server count
        0x05 => 36,  // add federated server
        0x06 => 36,  // add audit server
        0x07 => 36,  // remove federated server
        0x08 => 69,  // add federated server signing key
        0x09 => 54,  // add federated server bitcoin anchor key
        0x0a..=0x0f => return Ok(None),
        other => return Err(DecodeCause::UnknownEntryType(other)),
    };
    Ok(Some(size))
}

/// Decode an administrative block.
pub fn decode_admin_block(
    identifier: Hash,
    raw: &[u8],
    block_time: &str,
) -> Result<UnifiedBlockRecord, DecodeError> {
    let mut r = ByteReader::new(raw, BlockKind::Administrative);

    let chain_id = r.expect_chain_id(&ADMINISTRATIVE_CHAIN_ID)?;
    let prev_full_hash = r.read_hash()?;
    let _db_height = r.read_u32()?;
    r.skip_expansion_area()?;
    let message_count = r.read_u32()?;
    let body_size = r.read_u32()?;

    let body_start = r.position();
    let mut entries = Vec::with_capacity(message_count.min(1024) as usize);
    for _ in 0..message_count {
        let entry_start = r.position();
        let entry_type = r.read_u8()?;
        match fixed_payload_size(entry_type).map_err(|cause| r.error(cause))? {
            Some(size) => {
                r.read_bytes(size)?;
            }
            None => {
                let len = r.read_varint()?;
                let len = usize::try_from(len).map_err(|_| r.error(DecodeCause::InvalidVarInt))?;
                r.read_bytes(len)?;
            }
        }
        let serialized = hex::encode(r.consumed_since(entry_start));
        entries.push(EntryRecord::unhashed(serialized, block_time));
    }
    r.expect_body_size(body_start, u64::from(body_size))?;
    r.expect_end()?;

    Ok(UnifiedBlockRecord::new(
        BlockKind::Administrative,
        chain_id,
        identifier,
        prev_full_hash,
        entries,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{encode_admin_block, AdminEntry};

    const BLOCK_TIME: &str = "2015-09-20 17:00:00";

    #[test]
    fn test_decode_admin_block_entries_as_hex() {
        let prev = Hash::with_last_byte(0x77);
        let raw = encode_admin_block(
            prev,
            &[AdminEntry::minute(1), AdminEntry::signature(0xab)],
        );

        let block = decode_admin_block(Hash::with_last_byte(1), &raw, BLOCK_TIME).unwrap();
        assert_eq!(block.kind, BlockKind::Administrative);
        assert_eq!(block.chain_identifier, ADMINISTRATIVE_CHAIN_ID);
        assert_eq!(block.previous_identifier, prev);
        assert_eq!(block.entries.len(), 2);
        assert_eq!(block.entries[0].payload, "0001");
        assert_eq!(block.entries[1].payload.len(), 2 * 129);
        assert!(block.entries[1].payload.starts_with("01abab"));
        assert!(block.entries.iter().all(|e| e.hash.is_none()));
        assert!(block.entries.iter().all(|e| e.timestamp == BLOCK_TIME));
    }

    #[test]
    fn test_decode_admin_block_length_prefixed_entry() {
        let raw = encode_admin_block(Hash::ZERO, &[AdminEntry::variable(0x0b, vec![1, 2, 3])]);
        let block = decode_admin_block(Hash::with_last_byte(1), &raw, BLOCK_TIME).unwrap();
        assert_eq!(block.entries[0].payload, "0b03010203");
    }

    #[test]
    fn test_decode_admin_block_no_entries() {
        let raw = encode_admin_block(Hash::ZERO, &[]);
        let block = decode_admin_block(Hash::with_last_byte(1), &raw, BLOCK_TIME).unwrap();
        assert!(block.entries.is_empty());
    }

    #[test]
    fn test_decode_admin_block_unknown_entry_type() {
        let raw = encode_admin_block(Hash::ZERO, &[AdminEntry::raw(vec![0x42])]);
        let err = decode_admin_block(Hash::with_last_byte(1), &raw, BLOCK_TIME).unwrap_err();
        assert_eq!(err.kind, BlockKind::Administrative);
        assert_eq!(err.cause, DecodeCause::UnknownEntryType(0x42));
    }

    #[test]
    fn test_decode_admin_block_truncated() {
        let raw = encode_admin_block(Hash::ZERO, &[AdminEntry::signature(1)]);
        let err =
            decode_admin_block(Hash::with_last_byte(1), &raw[..raw.len() - 10], BLOCK_TIME)
                .unwrap_err();
        assert!(matches!(err.cause, DecodeCause::UnexpectedEof { .. }));
    }

    #[test]
    fn test_decode_admin_block_wrong_chain() {
        let mut raw = encode_admin_block(Hash::ZERO, &[]);
        raw[31] = 0x0c;
        let err = decode_admin_block(Hash::with_last_byte(1), &raw, BLOCK_TIME).unwrap_err();
        assert!(matches!(err.cause, DecodeCause::ChainIdMismatch { .. }));
    }

    #[test]
    fn test_decode_admin_block_trailing_bytes() {
        let mut raw = encode_admin_block(Hash::ZERO, &[AdminEntry::minute(2)]);
        raw.push(0);
        let err = decode_admin_block(Hash::with_last_byte(1), &raw, BLOCK_TIME).unwrap_err();
        assert_eq!(err.cause, DecodeCause::TrailingBytes(1));
    }
}
