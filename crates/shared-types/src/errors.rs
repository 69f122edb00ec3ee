//! # Error Types
//!
//! Errors shared by every crate that handles ledger identifiers.

use thiserror::Error;

/// Failure to turn text or bytes into a [`crate::Hash`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashParseError {
    /// Input decoded to the wrong number of bytes.
    #[error("Invalid hash length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required byte length
        expected: usize,
        /// Byte length received
        got: usize,
    },

    /// Input is not valid hex.
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_length_message() {
        let err = HashParseError::InvalidLength {
            expected: 32,
            got: 31,
        };
        assert!(err.to_string().contains("expected 32"));
        assert!(err.to_string().contains("got 31"));
    }
}
