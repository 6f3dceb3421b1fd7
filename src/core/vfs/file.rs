//! Open-file handles bound to store entries
//!
//! An accepted `open` produces a [`StoreFile`] and hands it to the
//! [`FdTable`] seam, which owns the mapping to real descriptor numbers.
//! The handle carries no data of its own; every read, write, and size
//! query goes through the adapter's data-path operations, so concurrent
//! handles on the same path always see the store's current entry.

use crate::core::vfs::syscalls::SyscallVfs;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

/// Descriptor-table seam accepted opens are handed to
///
/// The interception layer owns the real descriptor table; the adapter
/// only decides which opens it claims. Implementations bind the file to a
/// fresh descriptor and return it, and that number is what the engine
/// receives from its `open` call.
pub trait FdTable: Send + Sync {
    /// Bind `file` to a fresh descriptor and return it
    fn install(&self, file: StoreFile) -> i64;
}

/// An open file backed by a store entry
///
/// Constructed only for paths that passed `open` validation. The cursor
/// is per-handle; the content is whatever the store holds at the time of
/// each call.
pub struct StoreFile {
    vfs: Arc<SyscallVfs>,
    path: String,
    pos: u64,
}

impl StoreFile {
    pub(crate) fn new(vfs: Arc<SyscallVfs>, path: String) -> Self {
        StoreFile { vfs, path, pos: 0 }
    }

    /// The validated relative path this handle is bound to
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current cursor position
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Read at an explicit offset, leaving the cursor alone
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.vfs.read(&self.path, buf, offset)
    }

    /// Write at an explicit offset, leaving the cursor alone
    pub fn write_at(&self, data: &[u8], offset: u64) -> Result<usize> {
        self.vfs.write(&self.path, data, offset)?;
        Ok(data.len())
    }

    /// Size of the backing entry in bytes
    pub fn len(&self) -> Result<u64> {
        self.vfs.size(&self.path)
    }

    /// Whether the backing entry is absent or empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl fmt::Debug for StoreFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFile")
            .field("path", &self.path)
            .field("pos", &self.pos)
            .finish()
    }
}

impl Read for StoreFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.vfs.read(&self.path, buf, self.pos)?;
        self.pos += count as u64;
        Ok(count)
    }
}

impl Write for StoreFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.vfs.write(&self.path, buf, self.pos)?;
        self.pos += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Every write lands in the store whole; nothing is buffered here.
        Ok(())
    }
}

impl Seek for StoreFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => self.len()?.checked_add_signed(delta),
        };
        self.pos = target.ok_or_else(|| io::Error::from(crate::error::KvfsError::SeekOutOfRange))?;
        Ok(self.pos)
    }
}

/// Reference [`FdTable`] handing out sequential descriptor numbers
///
/// Keeps every installed handle until it is taken back out. Real
/// embeddings install files into the interception layer's own table; this
/// one serves tests, examples, and single-process setups.
#[derive(Debug)]
pub struct SimpleFdTable {
    inner: Mutex<SimpleFdTableInner>,
}

#[derive(Debug)]
struct SimpleFdTableInner {
    next: i64,
    files: HashMap<i64, StoreFile>,
}

impl SimpleFdTable {
    /// Create a table whose first descriptor will be `first_fd`
    pub fn new(first_fd: i64) -> Self {
        SimpleFdTable {
            inner: Mutex::new(SimpleFdTableInner {
                next: first_fd,
                files: HashMap::new(),
            }),
        }
    }

    /// Remove and return the handle bound to `fd`
    pub fn take(&self, fd: i64) -> Option<StoreFile> {
        self.inner.lock().files.remove(&fd)
    }
}

impl Default for SimpleFdTable {
    fn default() -> Self {
        // Leave room below for stdin, stdout, and stderr.
        SimpleFdTable::new(3)
    }
}

impl FdTable for SimpleFdTable {
    fn install(&self, file: StoreFile) -> i64 {
        let mut inner = self.inner.lock();
        let fd = inner.next;
        inner.next += 1;
        inner.files.insert(fd, file);
        fd
    }
}
