//! # Domain Errors
//!
//! Error types for directory block sync.
//!
//! | Error | Meaning | Aborts `synchronize()` |
//! |-------|---------|------------------------|
//! | `Source` | Ledger source unreachable or returned malformed data | yes |
//! | `Decode` | Sub-block bytes malformed for their kind | yes |
//! | `NotFound` | Lookup miss | never raised by a walk |

use shared_types::Hash;
use thiserror::Error;

use super::value_objects::BlockKind;

/// Why a sub-block failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeCause {
    /// Input ended before a field could be read.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the field requires
        needed: usize,
        /// Bytes left in the input
        remaining: usize,
    },

    /// Header chain id does not match the chain the block was routed for.
    #[error("chain id mismatch: expected {expected}, found {found}")]
    ChainIdMismatch {
        /// Chain id the dispatcher routed on
        expected: Hash,
        /// Chain id written in the block header
        found: Hash,
    },

    /// Entry type byte not known for this block kind.
    #[error("unknown entry type 0x{0:02x}")]
    UnknownEntryType(u8),

    /// Varint longer than 10 bytes or overflowing u64.
    #[error("invalid varint")]
    InvalidVarInt,

    /// Body length differs from the size declared in the header.
    #[error("body size mismatch: declared {declared}, consumed {consumed}")]
    BodySizeMismatch {
        /// Size from the header
        declared: u64,
        /// Bytes actually consumed by the declared entries
        consumed: u64,
    },

    /// Bytes left over after the declared content.
    #[error("{0} trailing bytes after block")]
    TrailingBytes(usize),

    /// Redeem condition type other than a single-signature RCD.
    #[error("unsupported RCD type 0x{0:02x}")]
    UnsupportedRcdType(u8),

    /// Transaction version zero (reserved for minute markers).
    #[error("transaction version must be non-zero")]
    ZeroTransactionVersion,
}

/// Malformed binary block of a known kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to decode {kind} block: {cause}")]
pub struct DecodeError {
    /// Kind the block was routed as.
    pub kind: BlockKind,
    /// What went wrong.
    pub cause: DecodeCause,
}

impl DecodeError {
    /// Create a new decode error.
    pub fn new(kind: BlockKind, cause: DecodeCause) -> Self {
        Self { kind, cause }
    }
}

/// Explorer error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplorerError {
    /// Remote ledger source failed or returned malformed data.
    #[error("Ledger source error: {0}")]
    Source(String),

    /// A sub-block failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Lookup miss. A normal negative result, never a walk failure.
    #[error("{what} not found: {key}")]
    NotFound {
        /// What was looked up
        what: &'static str,
        /// Key that missed
        key: String,
    },

    /// Configuration rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ExplorerError {
    /// Lookup miss for a directory block identifier.
    pub fn directory_block_not_found(identifier: &Hash) -> Self {
        Self::NotFound {
            what: "Directory block",
            key: identifier.to_string(),
        }
    }

    /// Lookup miss for a sequence height.
    pub fn height_not_found(height: u64) -> Self {
        Self::NotFound {
            what: "Directory block at height",
            key: height.to_string(),
        }
    }

    /// Lookup miss for a sub-block identifier.
    pub fn block_not_found(identifier: &Hash) -> Self {
        Self::NotFound {
            what: "Block",
            key: identifier.to_string(),
        }
    }

    /// True for lookup misses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExplorerError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_kind_and_cause() {
        let err = DecodeError::new(BlockKind::Credit, DecodeCause::UnknownEntryType(0x7f));
        let msg = err.to_string();
        assert!(msg.contains("credit"));
        assert!(msg.contains("0x7f"));
    }

    #[test]
    fn test_decode_error_converts_to_explorer_error() {
        let err: ExplorerError =
            DecodeError::new(BlockKind::Administrative, DecodeCause::InvalidVarInt).into();
        assert!(matches!(err, ExplorerError::Decode(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_helpers() {
        let err = ExplorerError::height_not_found(42);
        assert!(err.is_not_found());
        assert!(err.to_string().contains("42"));

        let err = ExplorerError::block_not_found(&Hash::with_last_byte(1));
        assert!(err.to_string().starts_with("Block not found"));
    }

    #[test]
    fn test_unexpected_eof_message() {
        let cause = DecodeCause::UnexpectedEof {
            needed: 32,
            remaining: 4,
        };
        assert!(cause.to_string().contains("needed 32"));
    }
}
