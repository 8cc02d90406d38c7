//! Queue Module
//!
//! Persistent FIFO queue on a single flat file.
//!
//! ## Responsibilities
//! - Append records at end of file
//! - Consume records forward from a persisted read cursor
//! - Reclaim consumed space on demand (vacuum)
//!
//! ## File Format
//! ```text
//! ┌──────────────────┬──────────────┬──────────────┬─────┐
//! │ Read cursor (W)  │ "payload\n"  │ "payload\n"  │ ... │
//! └──────────────────┴──────────────┴──────────────┴─────┘
//!                    ▲ consumed ... ▲ cursor       ▲ EOF
//! ```
//!
//! Reading only moves the cursor. The bytes before it stay on disk until
//! [`DiskQueue::vacuum`] rewrites the file, so the caller decides how often to
//! pay for compaction (see [`DiskQueue::stats`]).

mod engine;
mod vacuum;

pub use engine::{DiskQueue, QueueStats};
pub use vacuum::VacuumOutcome;
