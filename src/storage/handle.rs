//! Storage Handle
//!
//! Owns one open file and exposes explicit-offset primitives. No caller relies
//! on the OS file position between calls: every method seeks first.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::config::{Config, SyncStrategy};
use crate::error::{Result, SeqError};

/// Exclusively owned file backing a queue or stack
///
/// Cross-process exclusion is the engine's job (see `FileLock`).
#[derive(Debug)]
pub struct StorageHandle {
    path: PathBuf,
    file: File,
    sync_strategy: SyncStrategy,
}

impl StorageHandle {
    /// Open a file for read/write, creating it if missing
    ///
    /// A freshly created file is empty; the caller writes the header.
    pub fn open_or_create(path: &Path, config: &Config) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Self::from_file(path, file, config)
    }

    /// Create (or truncate) a file that nobody else should be using yet
    pub fn create(path: &Path, config: &Config) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Self::from_file(path, file, config)
    }

    fn from_file(path: &Path, file: File, config: &Config) -> Result<Self> {
        trace!(path = %path.display(), "opened storage handle");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_strategy: config.sync_strategy,
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file size, read from file metadata
    pub fn size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Read exactly `len` bytes at `offset`
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let size = self.size()?;
        let end = offset.saturating_add(len as u64);
        if end > size {
            return Err(SeqError::Corrupted(format!(
                "read of {} bytes at offset {} runs past end of file ({} bytes)",
                len, offset, size
            )));
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Buffered reader positioned at `offset`
    ///
    /// The reader borrows the handle; drop it before writing again.
    pub fn reader_at(&mut self, offset: u64) -> Result<BufReader<&mut File>> {
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(BufReader::new(&mut self.file))
    }

    /// Overwrite bytes starting at `offset`
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Append `data` with a single write call, returning the offset it landed at
    pub fn append(&mut self, data: &[u8]) -> Result<u64> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(data)?;
        Ok(offset)
    }

    /// Cut the file down to `new_size` bytes
    pub fn truncate(&mut self, new_size: u64) -> Result<()> {
        let size = self.size()?;
        if new_size > size {
            return Err(SeqError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, size
                ),
            )));
        }

        self.file.set_len(new_size)?;
        Ok(())
    }

    /// Append everything from `offset` to end of file onto `dest`
    ///
    /// Returns the number of bytes copied.
    pub fn copy_tail_to(&mut self, offset: u64, dest: &mut StorageHandle) -> Result<u64> {
        let expected = self.size()?.saturating_sub(offset);

        self.file.seek(SeekFrom::Start(offset))?;
        dest.file.seek(SeekFrom::End(0))?;
        let copied = io::copy(&mut (&mut self.file).take(expected), &mut dest.file)?;

        if copied != expected {
            return Err(SeqError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("copied {} of {} bytes", copied, expected),
            )));
        }
        Ok(copied)
    }

    /// Flush data to disk when the sync strategy asks for it
    ///
    /// Called once at the end of every mutating operation.
    pub fn commit(&mut self) -> Result<()> {
        match self.sync_strategy {
            SyncStrategy::EveryWrite => self.sync(),
            SyncStrategy::Never => Ok(()),
        }
    }

    /// Force data and metadata to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Move the file to `path`, keeping this handle open on it
    ///
    /// Replaces any file already at `path`. On failure the handle still
    /// refers to its old path.
    pub fn rename_to(&mut self, path: &Path) -> Result<()> {
        fs::rename(&self.path, path)?;
        trace!(from = %self.path.display(), to = %path.display(), "renamed storage file");
        self.path = path.to_path_buf();
        Ok(())
    }

    /// Close the handle and delete its file
    pub fn remove(self) -> Result<()> {
        let path = self.path.clone();
        drop(self);
        fs::remove_file(&path)?;
        trace!(path = %path.display(), "removed storage file");
        Ok(())
    }
}
