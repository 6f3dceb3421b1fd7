//! # kvfs - Key-Value Backed Virtual Filesystem Adapter
//!
//! `kvfs` lets a SQL storage engine that expects POSIX file semantics for
//! its database metadata run against an opaque key-value store instead.
//! It sits at the syscall boundary of a restricted environment, such as an
//! enclave runtime or a seccomp sandbox, and answers the file calls the
//! engine makes under its data directory from the store, while every other
//! call passes through to the host untouched.
//!
//! - **Selective interception**: only `open`, `stat`, `access`, `rename`,
//!   and `unlink` on store-managed paths are claimed
//! - **Strict path schema**: one folder level, `db.opt` and `*.frm` files
//!   only; anything else with those extensions is rejected loudly
//! - **Atomic renames**: a definition moves under one lock acquisition,
//!   so concurrent readers never see both names or neither
//! - **Temp-file promotion**: `*.frm~` files live on a scratch filesystem
//!   until the engine renames them into place, at which point the content
//!   moves into the store
//! - **Typed dispatch**: the unsafe register boundary is one module; the
//!   handlers themselves take and return plain Rust types
//!
//! ## Path schema
//!
//! | Engine path | Meaning | Backing |
//! |---|---|---|
//! | `/data/` | data directory root | listed from the `db.opt` family |
//! | `./<db>/` | database folder | probed via its `db.opt` entry |
//! | `./<db>/db.opt` | database options | `Db` column family |
//! | `./<db>/<table>.frm` | table definition | `Frm` column family |
//! | `./<db>/<table>.frm~` | in-progress definition | scratch filesystem |
//!
//! ## Quick start
//!
//! ```rust
//! use kvfs::{KvfsBuilder, MemoryStore, Outcome, SimpleFdTable};
//! use std::io::Read;
//! use std::sync::Arc;
//!
//! # fn main() -> kvfs::Result<()> {
//! let fds = Arc::new(SimpleFdTable::default());
//! let vfs = KvfsBuilder::new()
//!     .store(MemoryStore::new())
//!     .fd_table(fds.clone())
//!     .build()?;
//!
//! // A database exists once its db.opt entry does.
//! vfs.write("./shop/db.opt", b"default-character-set=utf8", 0)?;
//! assert_eq!(vfs.dir(".")?, vec!["shop".to_string()]);
//!
//! // Entries are materialized by their first write.
//! vfs.write("./shop/customers.frm", b"table definition", 0)?;
//!
//! // The engine's open arrives with the full data-directory path.
//! let outcome = vfs.open("/data/shop/customers.frm", 0)?;
//! assert_eq!(outcome, Outcome::Done(3));
//!
//! let mut file = fds.take(3).expect("handle was installed");
//! let mut content = Vec::new();
//! file.read_to_end(&mut content)?;
//! assert_eq!(content, b"table definition");
//! # Ok(())
//! # }
//! ```
//!
//! ## Typed dispatch
//!
//! Embeddings that intercept raw syscalls decode registers once and route
//! everything through [`SyscallVfs::dispatch`]:
//!
//! ```rust
//! use kvfs::{KvfsBuilder, MemoryStore, Outcome, SimpleFdTable, SyscallReply, SyscallRequest};
//! use std::sync::Arc;
//!
//! # fn main() -> kvfs::Result<()> {
//! let vfs = KvfsBuilder::new()
//!     .store(MemoryStore::new())
//!     .fd_table(Arc::new(SimpleFdTable::default()))
//!     .build()?;
//!
//! vfs.write("./shop/db.opt", b"", 0)?;
//!
//! // The engine probes for a database by calling access on its folder.
//! let reply = vfs.dispatch(SyscallRequest::Access { path: "./shop/" })?;
//! assert_eq!(reply, Outcome::Done(SyscallReply::Ret(0)));
//!
//! // Calls outside the managed schema are the host's business.
//! let reply = vfs.dispatch(SyscallRequest::Unlink { path: "/var/log/engine.log" })?;
//! assert!(reply.is_passthrough());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;

// Re-export the types embeddings work with
pub use crate::core::{
    config::{KvfsConfig, DEFAULT_DATA_ROOT},
    store::{ColumnFamily, MemoryStore, Store},
    vfs::{
        Errno, FdTable, FileStat, Outcome, SimpleFdTable, StoreFile, SyscallReply, SyscallRequest,
        SyscallVfs,
    },
};
pub use crate::error::{KvfsError, Result};

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Adapter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builder for a [`SyscallVfs`] instance
///
/// The store and the descriptor table have no sensible defaults and must
/// be provided; the roots fall back to the enclave deployment's values.
/// A full [`KvfsConfig`] replaces both root settings when given.
///
/// # Examples
///
/// ```rust
/// use kvfs::{KvfsBuilder, MemoryStore, SimpleFdTable};
/// use std::sync::Arc;
///
/// # fn main() -> kvfs::Result<()> {
/// let vfs = KvfsBuilder::new()
///     .store(MemoryStore::new())
///     .fd_table(Arc::new(SimpleFdTable::default()))
///     .data_root("/var/lib/engine")
///     .scratch_root("/tmp/engine-scratch")
///     .build()?;
///
/// assert_eq!(vfs.config().data_root(), "/var/lib/engine/");
/// # Ok(())
/// # }
/// ```
pub struct KvfsBuilder {
    store: Option<Box<dyn Store>>,
    fds: Option<Arc<dyn FdTable>>,
    config: Option<KvfsConfig>,
    data_root: Option<String>,
    scratch_root: Option<PathBuf>,
}

impl KvfsBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        KvfsBuilder {
            store: None,
            fds: None,
            config: None,
            data_root: None,
            scratch_root: None,
        }
    }

    /// Set the backing store
    pub fn store<S: Store + 'static>(mut self, store: S) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Set an already-boxed backing store
    pub fn boxed_store(mut self, store: Box<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the descriptor table accepted opens are handed to
    pub fn fd_table(mut self, fds: Arc<dyn FdTable>) -> Self {
        self.fds = Some(fds);
        self
    }

    /// Set the data-root prefix (a trailing `/` is appended if missing)
    pub fn data_root<S: Into<String>>(mut self, root: S) -> Self {
        self.data_root = Some(root.into());
        self
    }

    /// Set the scratch filesystem root
    pub fn scratch_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Set a full configuration, overriding any individual root settings
    pub fn config(mut self, config: KvfsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the adapter
    pub fn build(self) -> Result<Arc<SyscallVfs>> {
        let store = self.store.ok_or_else(|| {
            KvfsError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "store must be set",
            ))
        })?;

        let fds = self.fds.ok_or_else(|| {
            KvfsError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "fd table must be set",
            ))
        })?;

        let config = match self.config {
            Some(config) => config,
            None => KvfsConfig::new(
                self.data_root
                    .unwrap_or_else(|| DEFAULT_DATA_ROOT.to_string()),
                self.scratch_root.unwrap_or_else(|| PathBuf::from(".")),
            ),
        };

        info!("Building kvfs adapter with data root '{}'", config.data_root());
        Ok(Arc::new(SyscallVfs::new(store, fds, config)))
    }
}

impl Default for KvfsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_store() {
        let result = KvfsBuilder::new()
            .fd_table(Arc::new(SimpleFdTable::default()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_requires_fd_table() {
        let result = KvfsBuilder::new().store(MemoryStore::new()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_defaults() -> Result<()> {
        let vfs = KvfsBuilder::new()
            .store(MemoryStore::new())
            .fd_table(Arc::new(SimpleFdTable::default()))
            .build()?;

        assert_eq!(vfs.config().data_root(), DEFAULT_DATA_ROOT);

        Ok(())
    }

    #[test]
    fn test_builder_explicit_roots() -> Result<()> {
        let vfs = KvfsBuilder::new()
            .store(MemoryStore::new())
            .fd_table(Arc::new(SimpleFdTable::default()))
            .data_root("/var/lib/engine")
            .scratch_root("/tmp/engine-scratch")
            .build()?;

        assert_eq!(vfs.config().data_root(), "/var/lib/engine/");
        assert_eq!(
            vfs.config().scratch_root(),
            std::path::Path::new("/tmp/engine-scratch")
        );

        Ok(())
    }

    #[test]
    fn test_builder_config_wins() -> Result<()> {
        let vfs = KvfsBuilder::new()
            .store(MemoryStore::new())
            .fd_table(Arc::new(SimpleFdTable::default()))
            .data_root("/ignored")
            .config(KvfsConfig::new("/srv/db", "/srv/scratch"))
            .build()?;

        assert_eq!(vfs.config().data_root(), "/srv/db/");

        Ok(())
    }

    #[test]
    fn test_write_then_list() -> Result<()> {
        let vfs = KvfsBuilder::new()
            .store(MemoryStore::new())
            .fd_table(Arc::new(SimpleFdTable::default()))
            .build()?;

        vfs.write("./accounts/db.opt", b"", 0)?;
        vfs.write("./inventory/db.opt", b"", 0)?;

        assert_eq!(vfs.dir(".")?, vec!["accounts", "inventory"]);

        Ok(())
    }
}
