//! File Lock
//!
//! Advisory exclusive lock on a `<path>.lock` file next to the data file.
//! The data file itself is deleted and replaced by vacuum, so the lock lives
//! on a file whose identity never changes.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::trace;

use crate::config::{Config, LockMode};
use crate::error::{Result, SeqError};

/// Suffix of the lock file kept beside each data file
pub const LOCK_SUFFIX: &str = ".lock";

/// Exclusive lock guarding one queue or stack file
///
/// Released when dropped. The lock file is left on disk; deleting it while
/// another process waits on it would let two holders coexist.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    file: File,
}

impl FileLock {
    /// Take the lock for `data_path` without blocking
    ///
    /// Fails with `SeqError::Locked(data_path)` if another handle holds it.
    pub fn acquire(data_path: &Path) -> Result<Self> {
        let path = lock_path(data_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                SeqError::Locked(data_path.to_path_buf())
            } else {
                SeqError::Io(e)
            }
        })?;

        trace!(path = %path.display(), "acquired file lock");
        Ok(Self { path, file })
    }

    /// Take the lock if `config` asks for one
    pub fn for_config(data_path: &Path, config: &Config) -> Result<Option<Self>> {
        match config.lock_mode {
            LockMode::Exclusive => Self::acquire(data_path).map(Some),
            LockMode::None => Ok(None),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the descriptor releases it as well
        let _ = FileExt::unlock(&self.file);
    }
}

/// `<path>.lock`, next to the data file
pub fn lock_path(data_path: &Path) -> PathBuf {
    let mut name = OsString::from(data_path.as_os_str());
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}
