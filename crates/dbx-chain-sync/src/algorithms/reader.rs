//! # Byte Reader
//!
//! Cursor over a raw block. Every read is bounds-checked and fails with a
//! [`DecodeError`] tagged with the kind of block being decoded.
//!
//! Integers are big-endian. Varints use the ledger's base-128 encoding: most
//! significant 7-bit group first, high bit set on every byte but the last.

use shared_types::{Hash, HASH_LENGTH};

use crate::domain::{BlockKind, DecodeCause, DecodeError};

/// Longest varint that can still fit a u64.
pub const MAX_VARINT_LEN: usize = 10;

/// Bounds-checked cursor over raw block bytes.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    kind: BlockKind,
}

impl<'a> ByteReader<'a> {
    /// Start reading `data` as a block of `kind`.
    pub fn new(data: &'a [u8], kind: BlockKind) -> Self {
        Self { data, pos: 0, kind }
    }

    /// Build an error for this block's kind.
    pub fn error(&self, cause: DecodeCause) -> DecodeError {
        DecodeError::new(self.kind, cause)
    }

    /// Current offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Bytes between two offsets already consumed.
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.data[start..self.pos]
    }

    /// Next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.data.get(self.pos).copied().ok_or_else(|| {
            self.error(DecodeCause::UnexpectedEof {
                needed: 1,
                remaining: 0,
            })
        })
    }

    /// Consume `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(self.error(DecodeCause::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            }));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Consume one byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Consume a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    /// Consume a big-endian 48-bit integer.
    pub fn read_u48(&mut self) -> Result<u64, DecodeError> {
        let mut buf = [0u8; 8];
        buf[2..].copy_from_slice(self.read_bytes(6)?);
        Ok(u64::from_be_bytes(buf))
    }

    /// Consume a big-endian u64.
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    /// Consume a 32-byte hash.
    pub fn read_hash(&mut self) -> Result<Hash, DecodeError> {
        let mut buf = [0u8; HASH_LENGTH];
        buf.copy_from_slice(self.read_bytes(HASH_LENGTH)?);
        Ok(Hash::new(buf))
    }

    /// Consume a varint.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut value: u64 = 0;
        for _ in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            if value > (u64::MAX >> 7) {
                return Err(self.error(DecodeCause::InvalidVarInt));
            }
            value = (value << 7) | u64::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(self.error(DecodeCause::InvalidVarInt))
    }

    /// Consume a header expansion area (varint length, then that many bytes).
    pub fn skip_expansion_area(&mut self) -> Result<(), DecodeError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| self.error(DecodeCause::InvalidVarInt))?;
        self.read_bytes(len)?;
        Ok(())
    }

    /// Consume a hash and require it to equal `expected`.
    pub fn expect_chain_id(&mut self, expected: &Hash) -> Result<Hash, DecodeError> {
        let found = self.read_hash()?;
        if found != *expected {
            return Err(self.error(DecodeCause::ChainIdMismatch {
                expected: *expected,
                found,
            }));
        }
        Ok(found)
    }

    /// Require that a body started at `start` spans exactly `declared` bytes.
    pub fn expect_body_size(&self, start: usize, declared: u64) -> Result<(), DecodeError> {
        let consumed = (self.pos - start) as u64;
        if consumed != declared {
            return Err(self.error(DecodeCause::BodySizeMismatch { declared, consumed }));
        }
        Ok(())
    }

    /// Require that every byte has been consumed.
    pub fn expect_end(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(self.error(DecodeCause::TrailingBytes(n))),
        }
    }
}

/// Append `value` as a varint.
pub fn write_varint(value: u64, out: &mut Vec<u8>) {
    let mut groups = [0u8; MAX_VARINT_LEN];
    let mut n = 0;
    let mut rest = value;
    loop {
        groups[n] = (rest & 0x7f) as u8;
        n += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reader(data: &[u8]) -> ByteReader<'_> {
        ByteReader::new(data, BlockKind::Administrative)
    }

    #[test]
    fn test_read_integers_big_endian() {
        let data = [0, 0, 1, 2, 0, 0, 0, 0, 0, 7, 0, 0, 0, 0, 0, 0, 0, 9];
        let mut r = reader(&data);
        assert_eq!(r.read_u32().unwrap(), 0x0102);
        assert_eq!(r.read_u48().unwrap(), 7);
        assert_eq!(r.read_u64().unwrap(), 9);
        assert!(r.expect_end().is_ok());
    }

    #[test]
    fn test_read_past_end_fails() {
        let data = [1, 2];
        let mut r = reader(&data);
        let err = r.read_u32().unwrap_err();
        assert_eq!(err.kind, BlockKind::Administrative);
        assert_eq!(
            err.cause,
            DecodeCause::UnexpectedEof {
                needed: 4,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_varint_known_encodings() {
        let mut r = reader(&[0x00]);
        assert_eq!(r.read_varint().unwrap(), 0);

        let mut r = reader(&[0x81, 0x00]);
        assert_eq!(r.read_varint().unwrap(), 128);

        let mut buf = Vec::new();
        write_varint(300, &mut buf);
        assert_eq!(buf, vec![0x82, 0x2c]);
    }

    #[test]
    fn test_varint_too_long_fails() {
        let data = [0xff; 11];
        let mut r = reader(&data);
        assert_eq!(r.read_varint().unwrap_err().cause, DecodeCause::InvalidVarInt);
    }

    #[test]
    fn test_trailing_bytes_detected() {
        let data = [1, 2, 3];
        let mut r = reader(&data);
        r.read_u8().unwrap();
        assert_eq!(
            r.expect_end().unwrap_err().cause,
            DecodeCause::TrailingBytes(2)
        );
    }

    #[test]
    fn test_chain_id_mismatch() {
        let data = [0u8; 32];
        let mut r = reader(&data);
        let err = r.expect_chain_id(&Hash::with_last_byte(0x0a)).unwrap_err();
        assert!(matches!(err.cause, DecodeCause::ChainIdMismatch { .. }));
    }

    proptest! {
        #[test]
        fn prop_varint_reads_back(value in any::<u64>()) {
            let mut buf = Vec::new();
            write_varint(value, &mut buf);
            prop_assert!(buf.len() <= MAX_VARINT_LEN);

            let mut r = ByteReader::new(&buf, BlockKind::Credit);
            prop_assert_eq!(r.read_varint().unwrap(), value);
            prop_assert_eq!(r.remaining(), 0);
        }
    }
}
