//! # Value-Transfer Block Decoder
//!
//! ```text
//! chain_id [32] | body_mr [32] | prev_key_mr [32] | prev_ledger_key_mr [32]
//! exchange_rate u64 | db_height u32
//! header_expansion_size varint | header_expansion [n]
//! transaction_count u32 | body_size u32 | body
//! ```
//!
//! The body holds `transaction_count` transactions. A single `0x00` byte
//! where a transaction would start is a minute marker and is skipped.
//!
//! ```text
//! version varint (non-zero) | milli_timestamp u48
//! input_count u8 | output_count u8 | ec_output_count u8
//! inputs, outputs, ec_outputs: amount varint | address [32]
//! per input: rcd_type u8 (0x01) | public_key [32] | signature [64]
//! ```
//!
//! Each entry carries its own clock and hash, unlike the other kinds.

use std::fmt;

use shared_types::Hash;

use super::reader::ByteReader;
use crate::domain::{
    format_timestamp, BlockKind, DecodeCause, DecodeError, EntryRecord, UnifiedBlockRecord,
    VALUE_TRANSFER_CHAIN_ID,
};

const MINUTE_MARKER: u8 = 0x00;
const RCD_SINGLE_SIGNATURE: u8 = 0x01;
const PUBLIC_KEY_SIZE: usize = 32;
const SIGNATURE_SIZE: usize = 64;

/// Amount moved to or from one address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferIo {
    /// Amount in the smallest unit.
    pub amount: u64,
    /// Address (RCD hash).
    pub address: Hash,
}

impl fmt::Display for TransferIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.amount, self.address)
    }
}

/// Decoded value-transfer transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Format version.
    pub version: u64,
    /// Milliseconds since the Unix epoch.
    pub milli_timestamp: u64,
    /// Inputs.
    pub inputs: Vec<TransferIo>,
    /// Value outputs.
    pub outputs: Vec<TransferIo>,
    /// Entry credit purchase outputs.
    pub ec_outputs: Vec<TransferIo>,
    /// SHA-256 over the unsigned transaction bytes.
    pub hash: Hash,
}

impl Transaction {
    /// Formatted timestamp, at second precision.
    pub fn timestamp(&self) -> String {
        format_timestamp(self.milli_timestamp / 1000)
    }

    /// Normalize into an entry record.
    pub fn into_entry(self) -> EntryRecord {
        EntryRecord::hashed(self.to_string(), self.timestamp(), self.hash)
    }
}

fn join(ios: &[TransferIo]) -> String {
    ios.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Canonical string form: `tx <hash> ts=<millis> in=[..] out=[..] ec=[..]`.
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx {} ts={} in=[{}] out=[{}] ec=[{}]",
            self.hash,
            self.milli_timestamp,
            join(&self.inputs),
            join(&self.outputs),
            join(&self.ec_outputs)
        )
    }
}

fn read_ios(r: &mut ByteReader<'_>, count: u8) -> Result<Vec<TransferIo>, DecodeError> {
    let mut ios = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let amount = r.read_varint()?;
        let address = r.read_hash()?;
        ios.push(TransferIo { amount, address });
    }
    Ok(ios)
}

fn read_transaction(r: &mut ByteReader<'_>) -> Result<Transaction, DecodeError> {
    let start = r.position();
    let version = r.read_varint()?;
    if version == 0 {
        return Err(r.error(DecodeCause::ZeroTransactionVersion));
    }
    let milli_timestamp = r.read_u48()?;
    let input_count = r.read_u8()?;
    let output_count = r.read_u8()?;
    let ec_output_count = r.read_u8()?;

    let inputs = read_ios(r, input_count)?;
    let outputs = read_ios(r, output_count)?;
    let ec_outputs = read_ios(r, ec_output_count)?;
    let hash = Hash::sha256(r.consumed_since(start));

    for _ in 0..input_count {
        let rcd_type = r.read_u8()?;
        if rcd_type != RCD_SINGLE_SIGNATURE {
            return Err(r.error(DecodeCause::UnsupportedRcdType(rcd_type)));
        }
        r.read_bytes(PUBLIC_KEY_SIZE)?;
        r.read_bytes(SIGNATURE_SIZE)?;
    }

    Ok(Transaction {
        version,
        milli_timestamp,
        inputs,
        outputs,
        ec_outputs,
        hash,
    })
}

/// Decode every transaction of a value-transfer block.
pub fn decode_transactions(raw: &[u8]) -> Result<(Hash, Vec<Transaction>), DecodeError> {
    let mut r = ByteReader::new(raw, BlockKind::ValueTransfer);

    r.expect_chain_id(&VALUE_TRANSFER_CHAIN_ID)?;
    let _body_mr = r.read_hash()?;
    let prev_key_mr = r.read_hash()?;
    let _prev_ledger_key_mr = r.read_hash()?;
    let _exchange_rate = r.read_u64()?;
    let _db_height = r.read_u32()?;
    r.skip_expansion_area()?;
    let transaction_count = r.read_u32()?;
    let body_size = r.read_u32()?;

    let body_start = r.position();
    let mut transactions = Vec::with_capacity(transaction_count.min(1024) as usize);
    while transactions.len() < transaction_count as usize {
        if r.peek_u8()? == MINUTE_MARKER {
            r.read_u8()?;
            continue;
        }
        transactions.push(read_transaction(&mut r)?);
    }
    // Markers may also trail the last transaction.
    while r.position() - body_start < body_size as usize && r.peek_u8()? == MINUTE_MARKER {
        r.read_u8()?;
    }
    r.expect_body_size(body_start, u64::from(body_size))?;
    r.expect_end()?;

    Ok((prev_key_mr, transactions))
}

/// Decode a value-transfer block.
pub fn decode_value_transfer_block(
    identifier: Hash,
    raw: &[u8],
) -> Result<UnifiedBlockRecord, DecodeError> {
    let (prev_key_mr, transactions) = decode_transactions(raw)?;
    let entries = transactions.into_iter().map(Transaction::into_entry).collect();

    Ok(UnifiedBlockRecord::new(
        BlockKind::ValueTransfer,
        VALUE_TRANSFER_CHAIN_ID,
        identifier,
        prev_key_mr,
        entries,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{encode_value_transfer_block, TestTransaction};

    #[test]
    fn test_decode_value_transfer_block() {
        let prev = Hash::with_last_byte(0x99);
        let txs = vec![
            TestTransaction::coinbase(1_442_768_400_123, 500),
            TestTransaction::transfer(1_442_768_401_999, 70, 0x01, 0x02),
        ];
        let raw = encode_value_transfer_block(prev, &txs, true);

        let block = decode_value_transfer_block(Hash::with_last_byte(3), &raw).unwrap();
        assert_eq!(block.kind, BlockKind::ValueTransfer);
        assert_eq!(block.previous_identifier, prev);
        assert_eq!(block.entries.len(), 2);

        // Millisecond clock truncated to seconds
        assert_eq!(block.entries[0].timestamp, "2015-09-20 17:00:00");
        assert_eq!(block.entries[1].timestamp, "2015-09-20 17:00:01");

        for (entry, tx) in block.entries.iter().zip(&txs) {
            assert_eq!(entry.hash, Some(tx.expected_hash()));
            assert!(entry.payload.starts_with("tx "));
        }
        assert!(block.entries[1].payload.contains("ts=1442768401999"));
        assert!(block.entries[1].payload.contains("in=[70@"));
    }

    #[test]
    fn test_hash_excludes_signatures() {
        let tx = TestTransaction::transfer(1_000, 5, 0x01, 0x02);
        let raw_a = encode_value_transfer_block(Hash::ZERO, std::slice::from_ref(&tx), false);
        let mut other = tx.clone();
        other.signature_fill = 0xee;
        let raw_b = encode_value_transfer_block(Hash::ZERO, &[other], false);

        let (_, a) = decode_transactions(&raw_a).unwrap();
        let (_, b) = decode_transactions(&raw_b).unwrap();
        assert_eq!(a[0].hash, b[0].hash);
    }

    #[test]
    fn test_unsupported_rcd_type() {
        let mut tx = TestTransaction::transfer(1_000, 5, 0x01, 0x02);
        tx.rcd_type = 0x02;
        let raw = encode_value_transfer_block(Hash::ZERO, &[tx], false);

        let err = decode_value_transfer_block(Hash::with_last_byte(3), &raw).unwrap_err();
        assert_eq!(err.kind, BlockKind::ValueTransfer);
        assert_eq!(err.cause, DecodeCause::UnsupportedRcdType(0x02));
    }

    #[test]
    fn test_truncated_block_fails() {
        let raw = encode_value_transfer_block(
            Hash::ZERO,
            &[TestTransaction::coinbase(1_000, 1)],
            false,
        );
        let err =
            decode_value_transfer_block(Hash::with_last_byte(3), &raw[..raw.len() - 1]).unwrap_err();
        assert!(matches!(err.cause, DecodeCause::UnexpectedEof { .. }));
    }

    #[test]
    fn test_garbage_is_an_error_not_an_empty_block() {
        let err = decode_value_transfer_block(Hash::with_last_byte(3), &[0xde, 0xad]).unwrap_err();
        assert_eq!(err.kind, BlockKind::ValueTransfer);
    }
}
