//! Record codec
//!
//! A record on disk is its payload followed by a single `\n`. Trailing
//! whitespace is trimmed on write; the newline is stripped on read.

use std::borrow::Cow;
use std::fmt;
use std::io::BufRead;
use std::str::Utf8Error;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, SeqError};

/// Byte terminating every record
pub const TERMINATOR: u8 = b'\n';

/// Characters removed from the end of a payload before it is written
const TRAILING_WHITESPACE: &[u8] = b" \t\n\r\0\x0b";

// =============================================================================
// Record
// =============================================================================

/// One payload read back from a queue or stack
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Record(Bytes);

impl Record {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the payload as UTF-8
    pub fn to_str(&self) -> std::result::Result<&str, Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({:?})", self.to_string_lossy())
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Record> for Bytes {
    fn from(record: Record) -> Self {
        record.0
    }
}

impl PartialEq<[u8]> for Record {
    fn eq(&self, other: &[u8]) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<str> for Record {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other.as_bytes()
    }
}

impl PartialEq<&str> for Record {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == other.as_bytes()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Strip trailing whitespace and newlines from a payload
pub fn trim_payload(payload: &[u8]) -> &[u8] {
    let end = payload
        .iter()
        .rposition(|b| !TRAILING_WHITESPACE.contains(b))
        .map_or(0, |pos| pos + 1);
    &payload[..end]
}

/// Append `payload` as one record to `buf`, returning the bytes written
///
/// Fails with `InvalidRecord` if the trimmed payload still contains a newline.
pub fn encode_into(payload: &[u8], buf: &mut BytesMut) -> Result<usize> {
    let trimmed = trim_payload(payload);
    if let Some(pos) = trimmed.iter().position(|&b| b == TERMINATOR) {
        return Err(SeqError::InvalidRecord(format!(
            "payload contains an embedded newline at byte {}",
            pos
        )));
    }

    buf.reserve(trimmed.len() + 1);
    buf.put_slice(trimmed);
    buf.put_u8(TERMINATOR);
    Ok(trimmed.len() + 1)
}

// =============================================================================
// Decoding
// =============================================================================

/// Read the next complete record from `reader`
///
/// Returns the record and the number of bytes it occupied (newline included),
/// or `None` at end of file. Bytes after the last newline are an incomplete
/// record and yield `None` as well.
pub fn read_record<R: BufRead>(
    reader: &mut R,
    scratch: &mut Vec<u8>,
) -> Result<Option<(Record, u64)>> {
    scratch.clear();
    let read = reader.read_until(TERMINATOR, scratch)?;

    match scratch.last() {
        Some(&TERMINATOR) => {
            let payload = Bytes::copy_from_slice(&scratch[..read - 1]);
            Ok(Some((Record(payload), read as u64)))
        }
        _ => Ok(None),
    }
}
