//! Error types for adapter operations

use thiserror::Error;

/// Adapter operation result type
pub type Result<T> = std::result::Result<T, KvfsError>;

/// Adapter operation errors
///
/// These are contract violations and environment failures, not POSIX
/// failures. A path the engine is never supposed to present, or a write
/// whose end position cannot be represented, ends up here; an ordinary
/// "file does not exist" answer is delivered to the caller as an errno
/// instead and never surfaces as a `KvfsError`.
#[derive(Error, Debug)]
pub enum KvfsError {
    /// Path has a managed extension but does not fit the path schema
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    /// Path extension maps to no column family
    #[error("Unexpected extension: {path}")]
    UnexpectedExtension { path: String },

    /// No stored entry under a path that must exist at this point
    #[error("No stored entry: {path}")]
    NotFound { path: String },

    /// Write end position does not fit the address space
    #[error("Write overflow: offset {offset} plus {len} bytes is unrepresentable")]
    WriteOverflow { offset: u64, len: usize },

    /// Seek resolved outside the representable range
    #[error("Seek out of range")]
    SeekOutOfRange,

    /// Scratch filesystem I/O error
    #[error("Scratch I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl From<KvfsError> for std::io::Error {
    fn from(err: KvfsError) -> Self {
        use std::io::ErrorKind;

        let kind = match &err {
            KvfsError::NotFound { .. } => ErrorKind::NotFound,
            KvfsError::InvalidPath { .. }
            | KvfsError::UnexpectedExtension { .. }
            | KvfsError::WriteOverflow { .. }
            | KvfsError::SeekOutOfRange => ErrorKind::InvalidInput,
            KvfsError::Io(inner) => inner.kind(),
            KvfsError::Config(_) => ErrorKind::InvalidData,
        };
        std::io::Error::new(kind, err)
    }
}
