//! Storage Module
//!
//! File access layer under the queue and stack engines.
//!
//! ## Responsibilities
//! - Open or create the backing file
//! - Exclusive advisory lock on a sidecar `<path>.lock` file
//! - Positional reads and writes (every call names its offset)
//! - Append, truncate, tail copy, sync and delete
//!
//! The handle knows nothing about headers or records; the engines own all
//! format interpretation.

mod handle;
mod lock;

pub use handle::StorageHandle;
pub use lock::{lock_path, FileLock, LOCK_SUFFIX};
