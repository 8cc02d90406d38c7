//! # flatseq
//!
//! Persistent sequence structures backed by one flat file each:
//! - [`DiskQueue`]: FIFO with a persisted read cursor and explicit vacuum
//! - [`DiskStack`]: LIFO with inline back-links and truncate-on-pop
//!
//! Both keep only a fixed-width cursor in a header and never load the whole
//! structure into memory, so a file can hold millions of small records.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │        DiskQueue         │   │        DiskStack         │
//! │  add / get / vacuum      │   │  push / pop / peek       │
//! └────────────┬─────────────┘   └─────────────┬────────────┘
//!              │                               │
//!              ▼                               ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                         Codec                            │
//! │     CursorWidth (4/8-byte LE)  ·  Record ("payload\n")   │
//! └────────────────────────────┬────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     StorageHandle                        │
//! │   positional read/write · append · truncate · FileLock  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use flatseq::{DiskQueue, DiskStack};
//!
//! let mut queue = DiskQueue::open_path("jobs.queue").unwrap();
//! queue.add("first").unwrap();
//! queue.add_all(["second", "third"]).unwrap();
//! assert_eq!(queue.get().unwrap().unwrap(), "first");
//! queue.vacuum().unwrap();
//!
//! let mut stack = DiskStack::open_path("undo.stack").unwrap();
//! stack.push("x").unwrap();
//! assert_eq!(stack.pop().unwrap().unwrap(), "x");
//! ```
//!
//! A queue or stack holds an exclusive advisory lock on `<path>.lock` for as
//! long as it is alive; see [`config::LockMode`].

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod storage;
pub mod queue;
pub mod stack;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SeqError, Result};
pub use config::Config;
pub use codec::{CursorWidth, Record};
pub use queue::{DiskQueue, QueueStats, VacuumOutcome};
pub use stack::DiskStack;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of flatseq
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
