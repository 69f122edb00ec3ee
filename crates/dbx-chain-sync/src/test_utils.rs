//! Test utilities for directory block sync.
//!
//! Encoders producing well-formed sub-block bytes for each kind, and a
//! deterministic chain fixture that loads a [`MockLedgerSource`].
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use dbx_chain_sync::test_utils::ChainFixture;
//!
//! let fixture = ChainFixture::new(3);
//! assert_eq!(fixture.block(3).header.previous_identifier, fixture.block(2).identifier);
//! ```

use shared_types::Hash;

use crate::algorithms::write_varint;
use crate::domain::{
    BlockKind, DirectoryBlockHeader, EntryCounts, SubBlockRef, ADMINISTRATIVE_CHAIN_ID,
    CREDIT_CHAIN_ID, GENESIS_SENTINEL, VALUE_TRANSFER_CHAIN_ID,
};
use crate::ports::MockLedgerSource;

/// Unix time of the fixture's height 0.
pub const FIXTURE_EPOCH: u64 = 1_442_768_400;

/// Seconds between fixture directory blocks.
pub const FIXTURE_BLOCK_INTERVAL: u64 = 600;

// =============================================================================
// Administrative blocks
// =============================================================================

/// One serialized administrative entry (type byte included).
#[derive(Clone, Debug)]
pub struct AdminEntry(pub Vec<u8>);

impl AdminEntry {
    /// Minute number marker.
    pub fn minute(minute: u8) -> Self {
        Self(vec![0x00, minute])
    }

    /// Directory block signature filled with `fill`.
    pub fn signature(fill: u8) -> Self {
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&[fill; 128]);
        Self(bytes)
    }

    /// Length-prefixed entry of type `entry_type`.
    pub fn variable(entry_type: u8, data: Vec<u8>) -> Self {
        let mut bytes = vec![entry_type];
        write_varint(data.len() as u64, &mut bytes);
        bytes.extend_from_slice(&data);
        Self(bytes)
    }

    /// Arbitrary bytes.
    pub fn raw(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Serialize an administrative block.
pub fn encode_admin_block(previous: Hash, entries: &[AdminEntry]) -> Vec<u8> {
    let body: Vec<u8> = entries.iter().flat_map(|e| e.0.iter().copied()).collect();

    let mut out = Vec::new();
    out.extend_from_slice(ADMINISTRATIVE_CHAIN_ID.as_bytes());
    out.extend_from_slice(previous.as_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // db height
    write_varint(0, &mut out); // header expansion
    out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

// =============================================================================
// Credit blocks
// =============================================================================

/// One serialized credit entry (type byte included).
#[derive(Clone, Debug)]
pub struct CreditEntry(pub Vec<u8>);

impl CreditEntry {
    /// Server index marker.
    pub fn server_index(index: u8) -> Self {
        Self(vec![0x00, index])
    }

    /// Minute number marker.
    pub fn minute(minute: u8) -> Self {
        Self(vec![0x01, minute])
    }

    /// Chain commit filled with `fill`.
    pub fn commit_chain(fill: u8) -> Self {
        let mut bytes = vec![0x02];
        bytes.extend_from_slice(&[fill; 200]);
        Self(bytes)
    }

    /// Entry commit filled with `fill`.
    pub fn commit_entry(fill: u8) -> Self {
        let mut bytes = vec![0x03];
        bytes.extend_from_slice(&[fill; 136]);
        Self(bytes)
    }

    /// Balance increase; key and txid filled with `fill`.
    pub fn increase_balance(fill: u8, index: u64, credits: u64) -> Self {
        let mut bytes = vec![0x04];
        bytes.extend_from_slice(&[fill; 32]);
        bytes.extend_from_slice(&[fill; 32]);
        write_varint(index, &mut bytes);
        write_varint(credits, &mut bytes);
        Self(bytes)
    }

    /// Arbitrary bytes.
    pub fn raw(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Serialize a credit block.
pub fn encode_credit_block(previous: Hash, entries: &[CreditEntry]) -> Vec<u8> {
    let body: Vec<u8> = entries.iter().flat_map(|e| e.0.iter().copied()).collect();

    let mut out = Vec::new();
    out.extend_from_slice(CREDIT_CHAIN_ID.as_bytes());
    out.extend_from_slice(Hash::sha256(&body).as_bytes()); // body hash
    out.extend_from_slice(Hash::ZERO.as_bytes()); // prev header hash
    out.extend_from_slice(previous.as_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    write_varint(0, &mut out);
    out.extend_from_slice(&(entries.len() as u64).to_be_bytes());
    out.extend_from_slice(&(body.len() as u64).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

// =============================================================================
// Value-transfer blocks
// =============================================================================

/// Transaction description for [`encode_value_transfer_block`].
#[derive(Clone, Debug)]
pub struct TestTransaction {
    /// Milliseconds since the Unix epoch.
    pub milli_timestamp: u64,
    /// (amount, address) inputs.
    pub inputs: Vec<(u64, Hash)>,
    /// (amount, address) outputs.
    pub outputs: Vec<(u64, Hash)>,
    /// (amount, address) entry credit outputs.
    pub ec_outputs: Vec<(u64, Hash)>,
    /// RCD type written for every input.
    pub rcd_type: u8,
    /// Byte every signature is filled with.
    pub signature_fill: u8,
}

impl TestTransaction {
    /// Coinbase: one output, no inputs.
    pub fn coinbase(milli_timestamp: u64, amount: u64) -> Self {
        Self {
            milli_timestamp,
            inputs: vec![],
            outputs: vec![(amount, Hash::new([0xcb; 32]))],
            ec_outputs: vec![],
            rcd_type: 0x01,
            signature_fill: 0x5e,
        }
    }

    /// Single input to single output.
    pub fn transfer(milli_timestamp: u64, amount: u64, input_fill: u8, output_fill: u8) -> Self {
        Self {
            milli_timestamp,
            inputs: vec![(amount, Hash::new([input_fill; 32]))],
            outputs: vec![(amount, Hash::new([output_fill; 32]))],
            ec_outputs: vec![],
            rcd_type: 0x01,
            signature_fill: 0x5e,
        }
    }

    fn unsigned_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_varint(2, &mut out); // version
        out.extend_from_slice(&self.milli_timestamp.to_be_bytes()[2..]);
        out.push(self.inputs.len() as u8);
        out.push(self.outputs.len() as u8);
        out.push(self.ec_outputs.len() as u8);
        for (amount, address) in self.inputs.iter().chain(&self.outputs).chain(&self.ec_outputs) {
            write_varint(*amount, &mut out);
            out.extend_from_slice(address.as_bytes());
        }
        out
    }

    /// Hash the decoder must report for this transaction.
    pub fn expected_hash(&self) -> Hash {
        Hash::sha256(&self.unsigned_bytes())
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = self.unsigned_bytes();
        for _ in &self.inputs {
            out.push(self.rcd_type);
            out.extend_from_slice(&[0x9b; 32]);
            out.extend_from_slice(&[self.signature_fill; 64]);
        }
        out
    }
}

/// Serialize a value-transfer block. With `with_markers`, a minute marker
/// precedes every transaction and one trails the last.
pub fn encode_value_transfer_block(
    previous: Hash,
    transactions: &[TestTransaction],
    with_markers: bool,
) -> Vec<u8> {
    let mut body = Vec::new();
    for tx in transactions {
        if with_markers {
            body.push(0x00);
        }
        body.extend_from_slice(&tx.encode());
    }
    if with_markers {
        body.push(0x00);
    }

    let mut out = Vec::new();
    out.extend_from_slice(VALUE_TRANSFER_CHAIN_ID.as_bytes());
    out.extend_from_slice(Hash::sha256(&body).as_bytes()); // body mr
    out.extend_from_slice(previous.as_bytes());
    out.extend_from_slice(Hash::ZERO.as_bytes()); // prev ledger key mr
    out.extend_from_slice(&1000u64.to_be_bytes()); // exchange rate
    out.extend_from_slice(&0u32.to_be_bytes());
    write_varint(0, &mut out);
    out.extend_from_slice(&(transactions.len() as u32).to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

// =============================================================================
// Generic entry blocks
// =============================================================================

/// Serialize an entry block of `chain_id` listing `items`.
pub fn encode_entry_block(chain_id: Hash, previous: Hash, items: &[Hash]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(chain_id.as_bytes());
    out.extend_from_slice(Hash::ZERO.as_bytes()); // body mr
    out.extend_from_slice(previous.as_bytes());
    out.extend_from_slice(Hash::ZERO.as_bytes()); // prev full hash
    out.extend_from_slice(&0u32.to_be_bytes()); // eb sequence
    out.extend_from_slice(&0u32.to_be_bytes()); // db height
    out.extend_from_slice(&(items.len() as u32).to_be_bytes());
    for item in items {
        out.extend_from_slice(item.as_bytes());
    }
    out
}

// =============================================================================
// Chain fixture
// =============================================================================

/// User chain carried by every fixture directory block.
pub fn fixture_user_chain() -> Hash {
    Hash::new([0x5a; 32])
}

fn tagged(tag: &str, height: u64) -> Hash {
    Hash::sha256(format!("{tag}-{height}").as_bytes())
}

/// One directory block of a [`ChainFixture`] with its sub-block bytes.
#[derive(Clone, Debug)]
pub struct FixtureBlock {
    /// Directory block identifier.
    pub identifier: Hash,
    /// Header as the source serves it.
    pub header: DirectoryBlockHeader,
    /// Raw bytes per sub-block reference, in header order.
    pub raw: Vec<(SubBlockRef, Vec<u8>)>,
}

impl FixtureBlock {
    fn build(height: u64, previous: Hash) -> Self {
        let prev_of = |tag: &str| {
            if height == 1 {
                Hash::ZERO
            } else {
                tagged(tag, height - 1)
            }
        };
        let ms = (FIXTURE_EPOCH + height * FIXTURE_BLOCK_INTERVAL) * 1000;

        let raw = vec![
            (
                SubBlockRef::new(ADMINISTRATIVE_CHAIN_ID, tagged("admin", height)),
                encode_admin_block(
                    prev_of("admin"),
                    &[AdminEntry::minute(1), AdminEntry::signature(height as u8)],
                ),
            ),
            (
                SubBlockRef::new(CREDIT_CHAIN_ID, tagged("credit", height)),
                encode_credit_block(prev_of("credit"), &[CreditEntry::server_index(0)]),
            ),
            (
                SubBlockRef::new(VALUE_TRANSFER_CHAIN_ID, tagged("transfer", height)),
                encode_value_transfer_block(
                    prev_of("transfer"),
                    &[TestTransaction::coinbase(ms, 100 * height)],
                    true,
                ),
            ),
            (
                SubBlockRef::new(fixture_user_chain(), tagged("entry", height)),
                encode_entry_block(
                    fixture_user_chain(),
                    prev_of("entry"),
                    &[tagged("item-a", height), tagged("item-b", height)],
                ),
            ),
        ];

        let header = DirectoryBlockHeader {
            sequence_height: height,
            timestamp: FIXTURE_EPOCH + height * FIXTURE_BLOCK_INTERVAL,
            previous_identifier: previous,
            sub_block_refs: raw.iter().map(|(r, _)| r.clone()).collect(),
        };

        Self {
            identifier: tagged("dblock", height),
            header,
            raw,
        }
    }

    /// Entry counts a walk must record for this block.
    pub fn expected_counts(&self) -> EntryCounts {
        let mut counts = EntryCounts::default();
        counts.add(BlockKind::Administrative, 2);
        counts.add(BlockKind::Credit, 1);
        counts.add(BlockKind::ValueTransfer, 1);
        counts.add(BlockKind::GenericEntry, 2);
        counts
    }

    /// Reference of the sub-block of `kind` (first one for generic entries).
    pub fn sub_block(&self, kind: BlockKind) -> Option<&SubBlockRef> {
        self.raw
            .iter()
            .map(|(r, _)| r)
            .find(|r| crate::algorithms::classify(&r.chain_id) == kind)
    }
}

/// Deterministic directory block chain, heights `1..=len`.
#[derive(Clone, Debug, Default)]
pub struct ChainFixture {
    blocks: Vec<FixtureBlock>,
}

impl ChainFixture {
    /// Chain of `len` directory blocks above genesis.
    pub fn new(len: u64) -> Self {
        let mut fixture = Self::default();
        fixture.extend(len);
        fixture
    }

    /// Append `count` blocks on top of the current head.
    pub fn extend(&mut self, count: u64) {
        for _ in 0..count {
            let height = self.blocks.len() as u64 + 1;
            let block = FixtureBlock::build(height, self.head());
            self.blocks.push(block);
        }
    }

    /// Identifier of the highest block, or the sentinel for an empty chain.
    pub fn head(&self) -> Hash {
        self.blocks
            .last()
            .map(|b| b.identifier)
            .unwrap_or(GENESIS_SENTINEL)
    }

    /// Number of blocks.
    pub fn len(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// True for a chain with no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block at `height` (1-based).
    ///
    /// # Panics
    ///
    /// If `height` is outside `1..=len`.
    pub fn block(&self, height: u64) -> &FixtureBlock {
        &self.blocks[(height - 1) as usize]
    }

    /// All blocks, ascending by height.
    pub fn blocks(&self) -> &[FixtureBlock] {
        &self.blocks
    }

    /// Serve every block from `source` and point its head at ours.
    pub fn load_into(&self, source: &MockLedgerSource) {
        for block in &self.blocks {
            source.insert_directory_block(block.identifier, block.header.clone());
            for (sub_block, raw) in &block.raw {
                source.insert_raw(sub_block.identifier, raw.clone());
            }
        }
        source.set_head(self.head());
    }

    /// Fresh source serving this chain.
    pub fn source(&self) -> MockLedgerSource {
        let source = MockLedgerSource::new();
        self.load_into(&source);
        source
    }
}
