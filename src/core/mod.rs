//! Core implementation of the kvfs adapter
//!
//! - [`path`] - the path schema and data-root rewriting
//! - [`store`] - the backing store abstraction and in-memory backend
//! - [`dir`] - directory listings synthesized from store keys
//! - [`config`] - configurable roots
//! - [`vfs`] - the syscall adapter itself

pub mod config;
pub mod dir;
pub mod path;
pub mod store;
pub mod vfs;
