//! Stack Engine
//!
//! LIFO over a single file. Each record carries the offset of the record
//! below it, so pop is a header rewrite plus a truncate.

use std::path::{Path, PathBuf};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{self, Record};
use crate::config::Config;
use crate::error::{Result, SeqError};
use crate::storage::{FileLock, StorageHandle};

/// Persistent LIFO stack backed by one flat file
///
/// ## File Layout
/// ```text
/// [0, W)     top cursor (offset of the top record)
/// [W, EOF)   records, each "prev-cursor(W) payload\n"
/// ```
///
/// The bottom record sits at offset W and links to W. An empty stack is a
/// header holding W with nothing after it.
pub struct DiskStack {
    path: PathBuf,
    config: Config,
    storage: StorageHandle,
    _lock: Option<FileLock>,
}

impl DiskStack {
    /// Open or create a stack file
    ///
    /// A new (or zero-length) file gets an empty-stack header. An existing
    /// header is checked against the file size.
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let width = config.cursor_width;
        let lock = FileLock::for_config(&path, &config)?;
        let mut storage = StorageHandle::open_or_create(&path, &config)?;

        if storage.size()? == 0 {
            storage.write_at(0, &width.encode(width.header_len())?)?;
            storage.commit()?;
            debug!(path = %path.display(), bits = width.bits(), "created stack file");
        } else {
            debug!(path = %path.display(), bits = width.bits(), "opened stack file");
        }

        let mut stack = Self {
            path,
            config,
            storage,
            _lock: lock,
        };
        stack.locate_top()?;
        Ok(stack)
    }

    /// Open with the default config (32-bit cursors, exclusive lock)
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, Config::default())
    }

    /// Push one item on top of the stack
    ///
    /// The link field and payload go out in a single append; the header is
    /// updated afterwards.
    pub fn push(&mut self, item: impl AsRef<[u8]>) -> Result<()> {
        let width = self.config.cursor_width;
        let top = self.locate_top()?.unwrap_or(width.header_len());
        let new_top = self.storage.size()?;

        let mut buf = BytesMut::with_capacity(width.size() + item.as_ref().len() + 1);
        width.encode_into(top, &mut buf)?;
        codec::encode_into(item.as_ref(), &mut buf)?;
        let header = width.encode(new_top)?;

        self.storage.append(&buf)?;
        self.storage.write_at(0, &header)?;
        self.storage.commit()?;

        trace!(offset = new_top, bytes = buf.len(), "pushed record");
        Ok(())
    }

    /// Remove and return the top item, or `None` if the stack is empty
    pub fn pop(&mut self) -> Result<Option<Record>> {
        let width = self.config.cursor_width;
        let Some(top) = self.locate_top()? else {
            return Ok(None);
        };

        let (prev, record) = self.read_record_at(top)?;

        // Whichever step a crash interrupts must leave the record gone. Above
        // the bottom, a rewound header hides the tail. The bottom record's
        // header is already W, so only the truncate removes it.
        if top == width.header_len() {
            self.storage.truncate(top)?;
            self.storage.write_at(0, &width.encode(prev)?)?;
        } else {
            self.storage.write_at(0, &width.encode(prev)?)?;
            self.storage.truncate(top)?;
        }
        self.storage.commit()?;

        trace!(offset = top, prev, "popped record");
        Ok(Some(record))
    }

    /// Return the top item without removing it
    pub fn peek(&mut self) -> Result<Option<Record>> {
        match self.locate_top()? {
            Some(top) => Ok(Some(self.read_record_at(top)?.1)),
            None => Ok(None),
        }
    }

    /// Number of records, counted by walking the link chain
    ///
    /// O(n) in the stack depth; payloads are not read.
    pub fn depth(&mut self) -> Result<u64> {
        let width = self.config.cursor_width;
        let Some(mut offset) = self.locate_top()? else {
            return Ok(0);
        };

        let mut depth = 1;
        while offset != width.header_len() {
            let prev = width.decode(&self.storage.read_at(offset, width.size())?)?;
            check_link(prev, offset, width.header_len())?;
            offset = prev;
            depth += 1;
        }
        Ok(depth)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.locate_top()?.is_none())
    }

    /// Path of the stack file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Config the stack was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Offset of the top record, or `None` when the stack is empty
    ///
    /// The bottom record always starts right after the header, so a header of
    /// W means "empty" only while nothing follows the header. Any other value
    /// must leave room for at least a link field and a newline.
    fn locate_top(&mut self) -> Result<Option<u64>> {
        let width = self.config.cursor_width;
        let header_len = width.header_len();
        let size = self.storage.size()?;
        if size < header_len {
            return Err(SeqError::Corrupted(format!(
                "stack file is {} bytes, shorter than its {}-byte header",
                size,
                width.size()
            )));
        }

        let top = width.decode(&self.storage.read_at(0, width.size())?)?;

        // Smallest record: link field plus the newline
        let min_record = header_len + 1;
        if top < header_len || (size > header_len && top.saturating_add(min_record) > size) {
            return Err(SeqError::Corrupted(format!(
                "stack top {} cannot address a record in a {}-byte file (wrong cursor width?)",
                top, size
            )));
        }

        if size == header_len {
            if top != header_len {
                return Err(SeqError::Corrupted(format!(
                    "stack top {} points past the header of an empty file",
                    top
                )));
            }
            return Ok(None);
        }
        Ok(Some(top))
    }

    /// Read the link field and payload of the record at `offset`
    fn read_record_at(&mut self, offset: u64) -> Result<(u64, Record)> {
        let width = self.config.cursor_width;
        let prev = width.decode(&self.storage.read_at(offset, width.size())?)?;
        check_link(prev, offset, width.header_len())?;

        let mut reader = self.storage.reader_at(offset + width.header_len())?;
        let mut scratch = Vec::new();
        match codec::read_record(&mut reader, &mut scratch)? {
            Some((record, _)) => Ok((prev, record)),
            None => Err(SeqError::Corrupted(format!(
                "stack record at offset {} has no terminating newline",
                offset
            ))),
        }
    }
}

/// A link points at a lower record; the bottom record (at W) links to W
fn check_link(prev: u64, offset: u64, header_len: u64) -> Result<()> {
    let valid = if offset == header_len {
        prev == header_len
    } else {
        prev >= header_len && prev < offset
    };
    if !valid {
        return Err(SeqError::Corrupted(format!(
            "stack record at offset {} links to invalid offset {}",
            offset, prev
        )));
    }
    Ok(())
}
