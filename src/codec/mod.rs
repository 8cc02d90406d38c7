//! Codec Module
//!
//! Byte-level encoding shared by the queue and the stack.
//!
//! ## Field Formats
//! ```text
//! Cursor / link field (W = 4 or 8 bytes, little-endian)
//! ┌──────────────────────────────┐
//! │ offset: u32 | u64            │
//! └──────────────────────────────┘
//!
//! Record
//! ┌──────────────────────┬──────┐
//! │ payload (no '\n')    │ '\n' │
//! └──────────────────────┴──────┘
//! ```

mod cursor;
mod record;

pub use cursor::CursorWidth;
pub use record::{encode_into, read_record, trim_payload, Record, TERMINATOR};
