//! Configuration for flatseq
//!
//! Centralized configuration with sensible defaults. The same `Config` is used
//! for queues and stacks; the file path is passed separately at open time.

use crate::codec::CursorWidth;

/// Options applied to a queue or stack file
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Format Configuration
    // -------------------------------------------------------------------------
    /// Width of every cursor and link field in the file.
    ///
    /// Not stored in the file: reopening must use the width it was created with.
    pub cursor_width: CursorWidth,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// When to fsync after a mutating operation
    pub sync_strategy: SyncStrategy,

    /// Whether to hold an exclusive advisory lock on `<path>.lock`
    pub lock_mode: LockMode,

    // -------------------------------------------------------------------------
    // Queue Configuration
    // -------------------------------------------------------------------------
    /// Minimum consumed bytes before `vacuum` bothers rewriting the file
    pub vacuum_min_stale_bytes: u64,
}

/// Sync strategy for mutating operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Leave flushing to the OS (fastest)
    Never,

    /// fsync data after every add/get/push/pop (safest, slowest)
    EveryWrite,
}

/// Exclusion between handles on the same file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Hold an exclusive advisory lock for the lifetime of the queue or stack
    Exclusive,

    /// No lock; the caller guarantees a single writer
    None,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cursor_width: CursorWidth::U32,
            sync_strategy: SyncStrategy::Never,
            lock_mode: LockMode::Exclusive,
            vacuum_min_stale_bytes: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the cursor width (4 or 8 bytes)
    pub fn cursor_width(mut self, width: CursorWidth) -> Self {
        self.config.cursor_width = width;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the lock mode
    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.config.lock_mode = mode;
        self
    }

    /// Set the consumed-bytes threshold below which vacuum is skipped
    pub fn vacuum_min_stale_bytes(mut self, bytes: u64) -> Self {
        self.config.vacuum_min_stale_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
