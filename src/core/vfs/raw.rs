//! Raw syscall boundary
//!
//! The one place in the crate that touches caller-owned pointers, the
//! thread errno, and `struct stat` layout. Register words are decoded
//! into typed [`SyscallRequest`] values here and handler results are
//! encoded back into POSIX return conventions; nothing beyond this module
//! is unsafe.

use crate::core::vfs::syscalls::{Errno, FileStat, Outcome, SyscallReply, SyscallRequest, SyscallVfs};
use crate::error::Result;
use std::ffi::CStr;
use std::os::raw::{c_char, c_long};
use std::sync::Arc;
use tracing::trace;

impl SyscallVfs {
    /// Entry point for the raw interception layer
    ///
    /// `number` is the syscall number; `x1` and `x2` carry its first two
    /// argument registers. Returns `Ok(None)` when the call is not the
    /// adapter's to answer and must proceed to the host, `Ok(Some(ret))`
    /// when fully handled (`ret` follows the POSIX convention, with the
    /// thread errno set whenever it is `-1`), and `Err` on a caller
    /// contract violation the embedding should treat as fatal.
    ///
    /// A path argument that is null or not valid UTF-8 cannot name a
    /// store-managed file, so such calls pass through undecoded.
    ///
    /// # Safety
    ///
    /// Pointer-carrying arguments must be valid for the duration of the
    /// call: path arguments must point to NUL-terminated strings, and for
    /// `stat` the second register must point to a writable `libc::stat`.
    pub unsafe fn syscall(self: &Arc<Self>, number: c_long, x1: u64, x2: u64) -> Result<Option<i64>> {
        let request = match number {
            libc::SYS_open => match decode_path(x1) {
                Some(path) => SyscallRequest::Open {
                    path,
                    flags: x2 as i32,
                },
                None => return Ok(None),
            },
            libc::SYS_stat => match decode_path(x1) {
                Some(path) => SyscallRequest::Stat { path },
                None => return Ok(None),
            },
            libc::SYS_access => match decode_path(x1) {
                Some(path) => SyscallRequest::Access { path },
                None => return Ok(None),
            },
            libc::SYS_rename => match (decode_path(x1), decode_path(x2)) {
                (Some(old), Some(new)) => SyscallRequest::Rename { old, new },
                _ => return Ok(None),
            },
            libc::SYS_unlink => match decode_path(x1) {
                Some(path) => SyscallRequest::Unlink { path },
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        trace!("Decoded syscall {} into {:?}", number, request);

        Ok(match self.dispatch(request)? {
            Outcome::Passthrough => None,
            Outcome::Done(SyscallReply::Ret(ret)) => Some(ret),
            Outcome::Done(SyscallReply::Stat(stat)) => {
                encode_stat(x2, stat);
                Some(0)
            }
            Outcome::Fail(errno) => {
                set_errno(errno);
                Some(-1)
            }
        })
    }
}

// Register decoding and result encoding

/// Decode a path register into a borrowed string
unsafe fn decode_path<'a>(register: u64) -> Option<&'a str> {
    let ptr = register as *const c_char;
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Fill the caller's `struct stat` the way the engine expects it
///
/// The whole struct is zeroed first; the size is the only field the store
/// can answer for.
unsafe fn encode_stat(register: u64, stat: FileStat) {
    let out = register as *mut libc::stat;
    std::ptr::write_bytes(out, 0, 1);
    (*out).st_size = stat.size as libc::off_t;
}

/// Store an errno in the calling thread's errno slot
fn set_errno(errno: Errno) {
    unsafe { *libc::__errno_location() = errno.0 };
}
