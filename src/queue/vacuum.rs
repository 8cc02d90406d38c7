//! Queue Vacuum
//!
//! Reclaims the space of consumed records by rewriting the unread tail into a
//! temporary file and renaming it over the original.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SeqError};
use crate::storage::StorageHandle;

use super::engine::read_cursor;
use super::DiskQueue;

/// Suffix of the temporary file written during vacuum
const TEMP_SUFFIX: &str = ".tmp";

/// What a vacuum pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacuumOutcome {
    /// Nothing worth reclaiming (or the file was already gone)
    Unchanged,

    /// Every record was consumed; the file was deleted
    Removed {
        /// Size of the deleted file
        reclaimed: u64,
    },

    /// The unread tail was rewritten into a fresh file
    Compacted {
        /// Consumed bytes dropped from the file
        reclaimed: u64,
        /// Unread bytes carried over
        retained: u64,
    },
}

impl DiskQueue {
    /// Drop consumed records from the queue file
    ///
    /// Either the new file fully replaces the old one, or the old file is left
    /// exactly as it was and `SeqError::Vacuum` is returned.
    pub fn vacuum(&mut self) -> Result<VacuumOutcome> {
        let header_len = self.config.cursor_width.header_len();
        if !self.attach()? {
            return Ok(VacuumOutcome::Unchanged);
        }
        let Some(storage) = self.storage.as_mut() else {
            return Ok(VacuumOutcome::Unchanged);
        };

        let cursor = read_cursor(storage, &self.config)?;
        let size = storage.size()?;

        if cursor >= size {
            if let Some(storage) = self.storage.take() {
                storage.remove()?;
            }
            debug!(path = %self.path.display(), reclaimed = size, "removed drained queue file");
            return Ok(VacuumOutcome::Removed { reclaimed: size });
        }

        let stale = cursor - header_len;
        if stale == 0 || stale < self.config.vacuum_min_stale_bytes {
            debug!(
                path = %self.path.display(),
                stale,
                threshold = self.config.vacuum_min_stale_bytes,
                "vacuum skipped"
            );
            return Ok(VacuumOutcome::Unchanged);
        }

        let temp_path = temp_path(&self.path);
        let (mut compacted, retained) =
            match write_compacted(storage, &temp_path, cursor, &self.config) {
                Ok(written) => written,
                Err(e) => {
                    discard_temp(&temp_path);
                    return Err(SeqError::Vacuum(Box::new(e)));
                }
            };

        // The original stays open (and in use) until the rename lands
        if let Err(e) = compacted.rename_to(&self.path) {
            drop(compacted);
            discard_temp(&temp_path);
            return Err(SeqError::Vacuum(Box::new(e)));
        }
        self.storage = Some(compacted);

        info!(
            path = %self.path.display(),
            reclaimed = stale,
            retained,
            "compacted queue file"
        );
        Ok(VacuumOutcome::Compacted {
            reclaimed: stale,
            retained,
        })
    }
}

/// Write a fresh header plus `[cursor, EOF)` of `source` into `temp_path`
///
/// Returns the synced temp handle and the number of tail bytes copied.
fn write_compacted(
    source: &mut StorageHandle,
    temp_path: &Path,
    cursor: u64,
    config: &Config,
) -> Result<(StorageHandle, u64)> {
    let width = config.cursor_width;
    let mut temp = StorageHandle::create(temp_path, config)?;

    temp.append(&width.encode(width.header_len())?)?;
    let retained = source.copy_tail_to(cursor, &mut temp)?;
    temp.sync()?;

    Ok((temp, retained))
}

fn discard_temp(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %temp_path.display(), error = %e, "failed to remove vacuum temp file");
        }
    }
}

/// `<path>.tmp`, next to the queue file
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}
