//! # Core Identifiers
//!
//! Every block, chain and entry on the ledger is addressed by a 32-byte
//! content hash. On the wire (REST responses, logs, JSON dumps) the hash is
//! always written as 64 lowercase hex digits.
//!
//! ## Well-known values
//!
//! - [`Hash::ZERO`]: the all-zero value. As a previous-block link it marks
//!   the genesis block's non-existent predecessor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::errors::HashParseError;

/// Length of a ledger hash in bytes.
pub const HASH_LENGTH: usize = 32;

/// A 32-byte content hash (KeyMR, chain id, entry hash).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    /// The all-zero hash.
    pub const ZERO: Hash = Hash([0u8; HASH_LENGTH]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build a hash whose first 31 bytes are zero and whose last byte is `tail`.
    ///
    /// The ledger's system chains are identified this way.
    pub const fn with_last_byte(tail: u8) -> Self {
        let mut bytes = [0u8; HASH_LENGTH];
        bytes[HASH_LENGTH - 1] = tail;
        Self(bytes)
    }

    /// Copy a hash out of a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashParseError> {
        let array: [u8; HASH_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| HashParseError::InvalidLength {
                    expected: HASH_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Parse 64 hex digits.
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let bytes = hex::decode(s.trim()).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// SHA-256 of `data`.
    pub fn sha256(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; HASH_LENGTH];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Last byte of the hash.
    pub fn last_byte(&self) -> u8 {
        self.0[HASH_LENGTH - 1]
    }

    /// True for [`Hash::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LENGTH]
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; HASH_LENGTH]> for Hash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
