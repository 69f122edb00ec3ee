//! # Entry Credit Block Decoder
//!
//! ```text
//! chain_id [32] | body_hash [32] | prev_header_hash [32] | prev_full_hash [32]
//! db_height u32 | header_expansion_size varint | header_expansion [n]
//! object_count u64 | body_size u64 | body
//! ```

use shared_types::Hash;

use super::reader::ByteReader;
use crate::domain::{
    BlockKind, DecodeCause, DecodeError, EntryRecord, UnifiedBlockRecord, CREDIT_CHAIN_ID,
};

const SERVER_INDEX: u8 = 0x00;
const MINUTE_NUMBER: u8 = 0x01;
const COMMIT_CHAIN: u8 = 0x02;
const COMMIT_ENTRY: u8 = 0x03;
const INCREASE_BALANCE: u8 = 0x04;

const COMMIT_CHAIN_SIZE: usize = 200;
const COMMIT_ENTRY_SIZE: usize = 136;

fn skip_entry_payload(r: &mut ByteReader<'_>, entry_type: u8) -> Result<(), DecodeError> {
    match entry_type {
        SERVER_INDEX | MINUTE_NUMBER => {
            r.read_u8()?;
        }
        COMMIT_CHAIN => {
            r.read_bytes(COMMIT_CHAIN_SIZE)?;
        }
        COMMIT_ENTRY => {
            r.read_bytes(COMMIT_ENTRY_SIZE)?;
        }
        INCREASE_BALANCE => {
            r.read_hash()?; // ec public key
            r.read_hash()?; // txid
            r.read_varint()?; // index
            r.read_varint()?; // credits
        }
        other => return Err(r.error(DecodeCause::UnknownEntryType(other))),
    }
    Ok(())
}

/// Decode an entry credit block.
pub fn decode_credit_block(
    identifier: Hash,
    raw: &[u8],
    block_time: &str,
) -> Result<UnifiedBlockRecord, DecodeError> {
    let mut r = ByteReader::new(raw, BlockKind::Credit);

    let chain_id = r.expect_chain_id(&CREDIT_CHAIN_ID)?;
    let _body_hash = r.read_hash()?;
    let _prev_header_hash = r.read_hash()?;
    let prev_full_hash = r.read_hash()?;
    let _db_height = r.read_u32()?;
    r.skip_expansion_area()?;
    let object_count = r.read_u64()?;
    let body_size = r.read_u64()?;

    let body_start = r.position();
    let mut entries = Vec::with_capacity(object_count.min(1024) as usize);
    for _ in 0..object_count {
        let entry_start = r.position();
        let entry_type = r.read_u8()?;
        skip_entry_payload(&mut r, entry_type)?;
        let serialized = hex::encode(r.consumed_since(entry_start));
        entries.push(EntryRecord::unhashed(serialized, block_time));
    }
    r.expect_body_size(body_start, body_size)?;
    r.expect_end()?;

    Ok(UnifiedBlockRecord::new(
        BlockKind::Credit,
        chain_id,
        identifier,
        prev_full_hash,
        entries,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{encode_credit_block, CreditEntry};

    const BLOCK_TIME: &str = "2015-09-20 17:00:00";

    #[test]
    fn test_decode_credit_block() {
        let prev = Hash::with_last_byte(0x55);
        let raw = encode_credit_block(
            prev,
            &[
                CreditEntry::server_index(0),
                CreditEntry::commit_entry(0x11),
                CreditEntry::minute(1),
                CreditEntry::increase_balance(0x22, 3, 1000),
                CreditEntry::commit_chain(0x33),
            ],
        );

        let block = decode_credit_block(Hash::with_last_byte(2), &raw, BLOCK_TIME).unwrap();
        assert_eq!(block.kind, BlockKind::Credit);
        assert_eq!(block.previous_identifier, prev);
        assert_eq!(block.entries.len(), 5);
        assert_eq!(block.entries[0].payload, "0000");
        assert_eq!(block.entries[1].payload.len(), 2 * (1 + COMMIT_ENTRY_SIZE));
        assert_eq!(block.entries[2].payload, "0101");
        assert!(block.entries[3].payload.starts_with("04"));
        assert_eq!(block.entries[4].payload.len(), 2 * (1 + COMMIT_CHAIN_SIZE));
        assert!(block.entries.iter().all(|e| e.hash.is_none()));
    }

    #[test]
    fn test_decode_credit_block_unknown_type() {
        let raw = encode_credit_block(Hash::ZERO, &[CreditEntry::raw(vec![0x09, 0x00])]);
        let err = decode_credit_block(Hash::with_last_byte(2), &raw, BLOCK_TIME).unwrap_err();
        assert_eq!(err.kind, BlockKind::Credit);
        assert_eq!(err.cause, DecodeCause::UnknownEntryType(0x09));
    }

    #[test]
    fn test_decode_credit_block_body_size_mismatch() {
        let mut raw = encode_credit_block(Hash::ZERO, &[CreditEntry::minute(3)]);
        // body_size is the last header field, just before the 2-byte body
        let size_offset = raw.len() - 2 - 8;
        raw[size_offset + 7] = 5;
        let err = decode_credit_block(Hash::with_last_byte(2), &raw, BLOCK_TIME).unwrap_err();
        assert_eq!(
            err.cause,
            DecodeCause::BodySizeMismatch {
                declared: 5,
                consumed: 2
            }
        );
    }
}
