//! Virtual filesystem surface
//!
//! Split into the typed handler core ([`syscalls`]), the open-file handle
//! layer ([`file`]), and the raw register boundary (`raw`, the only
//! unsafe code in the crate).

pub mod file;
mod raw;
pub mod syscalls;


pub use file::{FdTable, SimpleFdTable, StoreFile};
pub use syscalls::{Errno, FileStat, Outcome, SyscallReply, SyscallRequest, SyscallVfs};
