//! Binary cursor codec
//!
//! Every header and link field is a fixed-width little-endian unsigned offset.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, SeqError};

/// Width of the cursor and link fields of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorWidth {
    /// 4-byte cursors; files up to 4 GiB
    #[default]
    U32,
    /// 8-byte cursors
    U64,
}

impl CursorWidth {
    /// Parse a width given in bits (32 or 64)
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            32 => Ok(Self::U32),
            64 => Ok(Self::U64),
            other => Err(SeqError::InvalidArgument(format!(
                "cursor width must be 32 or 64 bits, got {}",
                other
            ))),
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            Self::U32 => 32,
            Self::U64 => 64,
        }
    }

    /// Encoded size in bytes (W)
    pub const fn size(self) -> usize {
        match self {
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }

    /// Header length, which is also the offset of the first record
    pub const fn header_len(self) -> u64 {
        self.size() as u64
    }

    /// Largest offset this width can represent
    pub const fn max_offset(self) -> u64 {
        match self {
            Self::U32 => u32::MAX as u64,
            Self::U64 => u64::MAX,
        }
    }

    /// Fail with `OffsetOverflow` unless `offset` is representable
    pub fn check(self, offset: u64) -> Result<()> {
        if offset > self.max_offset() {
            return Err(SeqError::OffsetOverflow {
                offset,
                bits: self.bits(),
            });
        }
        Ok(())
    }

    /// Append the encoded `offset` to `buf`
    pub fn encode_into(self, offset: u64, buf: &mut BytesMut) -> Result<()> {
        self.check(offset)?;
        match self {
            Self::U32 => buf.put_u32_le(offset as u32),
            Self::U64 => buf.put_u64_le(offset),
        }
        Ok(())
    }

    /// Encode `offset` into a fresh W-byte buffer
    pub fn encode(self, offset: u64) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// Decode the first W bytes of `bytes`
    ///
    /// A short slice means a truncated header or link field.
    pub fn decode(self, mut bytes: &[u8]) -> Result<u64> {
        if bytes.len() < self.size() {
            return Err(SeqError::Corrupted(format!(
                "cursor field needs {} bytes, found {}",
                self.size(),
                bytes.len()
            )));
        }
        Ok(match self {
            Self::U32 => u64::from(bytes.get_u32_le()),
            Self::U64 => bytes.get_u64_le(),
        })
    }
}
