//! # Directory Block Sync
//!
//! Walks a ledger's directory block chain from the current head back to
//! genesis, decodes every sub-block each directory block references, and
//! keeps the results in an in-memory index.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Sub-block kinds
//!
//! | Kind | Chain id | Entry payload | Entry timestamp | Entry hash |
//! |------|----------|---------------|-----------------|------------|
//! | Administrative | `...0a` | hex | directory block | none |
//! | Credit | `...0c` | hex | directory block | none |
//! | Value-transfer | `...0f` | transaction string | own (ms) | own |
//! | Generic entry | any other | hex | directory block | = payload |
//!
//! ## Resumption
//!
//! A walk commits each directory block as soon as all of its sub-blocks
//! decode. When a walk aborts, the next one steps over the cached blocks by
//! their previous-links and continues where the failure happened. It stops
//! early only at a block no higher than `SyncProgress::synchronized_height`,
//! below which every block down to genesis is known to be cached.
//!
//! Heights must strictly decrease along the walk; a header that breaks this
//! is reported as a source error.
//!
//! ## Module Structure
//!
//! ```text
//! dbx-chain-sync/
//! ├── domain/          # Records, block kinds, errors, chain ids
//! ├── algorithms/      # Byte reader, four decoders, routing
//! ├── ports/           # ExplorerApi (inbound) + LedgerSource (outbound)
//! ├── application/     # BlockIndex, DecodeDispatcher, SyncService
//! └── config.rs        # SyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use algorithms::{classify, decode_block};
pub use application::{BlockIndex, DecodeDispatcher, SyncService};
pub use config::SyncConfig;
pub use domain::{
    BlockKind, DecodeCause, DecodeError, DirectoryBlockHeader, DirectoryBlockRecord, EntryCounts,
    EntryRecord, ExplorerError, SubBlockRef, SubBlocks, SyncProgress, SyncReport,
    UnifiedBlockRecord, ADMINISTRATIVE_CHAIN_ID, CREDIT_CHAIN_ID, GENESIS_SENTINEL,
    VALUE_TRANSFER_CHAIN_ID,
};
pub use ports::{ExplorerApi, LedgerSource, MockLedgerSource};
pub use shared_types::Hash;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
