//! Error types for flatseq
//!
//! Provides a unified error type for queue and stack operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using SeqError
pub type Result<T> = std::result::Result<T, SeqError>;

/// Unified error type for flatseq operations
#[derive(Debug, Error)]
pub enum SeqError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Another handle (this process or another) owns the file lock
    #[error("file is locked by another handle: {}", .0.display())]
    Locked(PathBuf),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload would break the one-record-per-line format
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("offset {offset} does not fit in a {bits}-bit cursor")]
    OffsetOverflow { offset: u64, bits: u32 },

    // -------------------------------------------------------------------------
    // Structural Errors
    // -------------------------------------------------------------------------
    #[error("Corruption detected: {0}")]
    Corrupted(String),

    /// Compaction failed; the original queue file is unchanged
    #[error("vacuum failed, original file left intact: {0}")]
    Vacuum(Box<SeqError>),
}
