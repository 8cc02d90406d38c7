//! Stack Module
//!
//! Persistent LIFO stack on a single flat file.
//!
//! ## File Format
//! ```text
//! ┌───────────────┬───────────────────────┬───────────────────────┬─────┐
//! │ Top cursor(W) │ prev(W) | "payload\n" │ prev(W) | "payload\n" │ ... │
//! └───────────────┴───────────────────────┴───────────────────────┴─────┘
//!         │          ▲ bottom (prev = W)     ▲ top = last record
//!         └──────────────────────────────────┘
//! ```
//!
//! The top record is always the tail of the file, so there is nothing to
//! compact: pop truncates it away.

mod engine;

pub use engine::DiskStack;
