//! Queue Engine
//!
//! FIFO over a single file. Reads advance the persisted cursor; consumed
//! bytes stay on disk until `vacuum` runs.

use std::path::{Path, PathBuf};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{self, Record};
use crate::config::Config;
use crate::error::{Result, SeqError};
use crate::storage::{FileLock, StorageHandle};

/// Persistent FIFO queue backed by one flat file
///
/// ## File Layout
/// ```text
/// [0, W)     read cursor (offset of the next unread record)
/// [W, EOF)   records, each "payload\n"
/// ```
///
/// The lock on `<path>.lock` is held for the queue's whole lifetime, including
/// while vacuum has the data file removed or mid-replacement.
pub struct DiskQueue {
    /// Location of the queue file
    pub(super) path: PathBuf,

    /// Options the queue was opened with
    pub(super) config: Config,

    /// Open file; `None` after vacuum removed a fully drained queue
    pub(super) storage: Option<StorageHandle>,

    /// Exclusive lock, unless the config opted out
    _lock: Option<FileLock>,
}

/// Snapshot of the queue file's space usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Total size of the file, header included
    pub file_size: u64,
    /// Offset of the next unread record
    pub cursor: u64,
    /// Bytes already consumed but still on disk
    pub stale_bytes: u64,
    /// Bytes not yet consumed
    pub pending_bytes: u64,
}

impl DiskQueue {
    /// Open or create a queue file
    ///
    /// A new (or zero-length) file gets a header pointing at the first record.
    /// An existing header is range-checked against the file size.
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = FileLock::for_config(&path, &config)?;
        let storage = open_storage(&path, &config)?;

        Ok(Self {
            path,
            config,
            storage: Some(storage),
            _lock: lock,
        })
    }

    /// Open with the default config (32-bit cursors, exclusive lock)
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, Config::default())
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Append one item at the tail of the queue
    pub fn add(&mut self, item: impl AsRef<[u8]>) -> Result<()> {
        self.add_all(std::iter::once(item))
    }

    /// Append items in iteration order
    ///
    /// All items are validated and encoded first, then written with a single
    /// append, so an invalid item leaves the file untouched.
    pub fn add_all<I, T>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut buf = BytesMut::new();
        let mut count = 0usize;
        for item in items {
            codec::encode_into(item.as_ref(), &mut buf)?;
            count += 1;
        }
        if count == 0 {
            return Ok(());
        }

        let width = self.config.cursor_width;
        let storage = self.storage_or_create()?;

        // The cursor must be able to reach the new end of file
        let end = storage.size()?;
        width.check(end + buf.len() as u64)?;

        storage.append(&buf)?;
        storage.commit()?;

        trace!(count, bytes = buf.len(), "appended records");
        Ok(())
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Take the record at the head of the queue, or `None` if empty
    pub fn get(&mut self) -> Result<Option<Record>> {
        Ok(self.get_many(1)?.into_iter().next())
    }

    /// Take up to `count` records from the head of the queue
    ///
    /// Returns fewer than `count` records (possibly none) when the queue runs
    /// out. `count` must be at least 1.
    pub fn get_many(&mut self, count: usize) -> Result<Vec<Record>> {
        if count == 0 {
            return Err(SeqError::InvalidArgument(
                "get count must be at least 1".to_string(),
            ));
        }

        let width = self.config.cursor_width;
        if !self.attach()? {
            return Ok(Vec::new());
        }
        let Some(storage) = self.storage.as_mut() else {
            return Ok(Vec::new());
        };

        let cursor = read_cursor(storage, &self.config)?;
        if cursor >= storage.size()? {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut position = cursor;
        {
            let mut reader = storage.reader_at(cursor)?;
            let mut scratch = Vec::new();
            while records.len() < count {
                match codec::read_record(&mut reader, &mut scratch)? {
                    Some((record, consumed)) => {
                        position += consumed;
                        records.push(record);
                    }
                    None => break,
                }
            }
        }

        if position != cursor {
            storage.write_at(0, &width.encode(position)?)?;
            storage.commit()?;
        }

        trace!(requested = count, returned = records.len(), cursor = position, "read records");
        Ok(records)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// True when every record has been consumed (or the file is gone)
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.stats()?.pending_bytes == 0)
    }

    /// Current space usage; all zeros while vacuum has the file removed
    pub fn stats(&mut self) -> Result<QueueStats> {
        self.attach()?;
        let Some(storage) = self.storage.as_mut() else {
            return Ok(QueueStats {
                file_size: 0,
                cursor: 0,
                stale_bytes: 0,
                pending_bytes: 0,
            });
        };

        let cursor = read_cursor(storage, &self.config)?;
        let file_size = storage.size()?;
        let header_len = self.config.cursor_width.header_len();

        Ok(QueueStats {
            file_size,
            cursor,
            stale_bytes: cursor.saturating_sub(header_len),
            pending_bytes: file_size.saturating_sub(cursor),
        })
    }

    /// Path of the queue file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Config the queue was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Make sure `storage` is open whenever the queue file exists
    ///
    /// `storage` can be `None` with the file still on disk when a vacuum step
    /// failed half way, or when another writer recreated it (`LockMode::None`).
    /// Returns false only when the file is really absent.
    pub(super) fn attach(&mut self) -> Result<bool> {
        if self.storage.is_some() {
            return Ok(true);
        }
        if !self.path.try_exists()? {
            return Ok(false);
        }

        debug!(path = %self.path.display(), "reattaching to queue file");
        self.storage = Some(open_storage(&self.path, &self.config)?);
        Ok(true)
    }

    /// The open handle, recreating the file if vacuum removed it
    fn storage_or_create(&mut self) -> Result<&mut StorageHandle> {
        let storage = match self.storage.take() {
            Some(storage) => storage,
            None => {
                debug!(path = %self.path.display(), "recreating queue file");
                open_storage(&self.path, &self.config)?
            }
        };
        Ok(self.storage.insert(storage))
    }
}

/// Open a queue file and make sure it carries a sane header
fn open_storage(path: &Path, config: &Config) -> Result<StorageHandle> {
    let mut storage = StorageHandle::open_or_create(path, config)?;
    let width = config.cursor_width;

    if storage.size()? == 0 {
        storage.write_at(0, &width.encode(width.header_len())?)?;
        storage.commit()?;
        debug!(path = %path.display(), bits = width.bits(), "created queue file");
    } else {
        read_cursor(&mut storage, config)?;
        debug!(path = %path.display(), bits = width.bits(), "opened queue file");
    }

    Ok(storage)
}

/// Read the header cursor and check it lies within `[W, file size]`
pub(super) fn read_cursor(storage: &mut StorageHandle, config: &Config) -> Result<u64> {
    let width = config.cursor_width;
    let size = storage.size()?;
    if size < width.header_len() {
        return Err(SeqError::Corrupted(format!(
            "queue file is {} bytes, shorter than its {}-byte header",
            size,
            width.size()
        )));
    }

    let cursor = width.decode(&storage.read_at(0, width.size())?)?;
    if cursor < width.header_len() || cursor > size {
        return Err(SeqError::Corrupted(format!(
            "queue cursor {} outside [{}, {}] (wrong cursor width?)",
            cursor,
            width.header_len(),
            size
        )));
    }

    Ok(cursor)
}
