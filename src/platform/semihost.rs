//! Forward semihosting requests to the host using GDB's File-I/O extension.
//!
//! When the interrupted program makes a semihosting call (e.g: a `bkpt 0xab`
//! on ARM), the monitor turns it into an `F` request packet instead of
//! reporting a stop. The host performs the operation and answers with an `F`
//! reply, after which the platform is handed the return values and the program
//! resumes as though the call had been serviced locally.

/// A semihosting request decoded by the platform.
///
/// Buffer and path arguments are target addresses: the host fetches (or
/// stores) their contents with ordinary `m`/`M` packets while servicing the
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemihostRequest {
    /// `open(path, flags, mode)`. `path_len` includes the NUL terminator.
    Open {
        /// Address of the path string.
        path: u32,
        /// Length of the path string, including the NUL terminator.
        path_len: u32,
        /// GDB File-I/O open flags.
        flags: u32,
        /// GDB File-I/O mode bits.
        mode: u32,
    },
    /// `close(fd)`.
    Close {
        /// File descriptor.
        fd: u32,
    },
    /// `read(fd, buf, len)`.
    Read {
        /// File descriptor.
        fd: u32,
        /// Address of the destination buffer.
        buf: u32,
        /// Number of bytes to read.
        len: u32,
    },
    /// `write(fd, buf, len)`.
    Write {
        /// File descriptor.
        fd: u32,
        /// Address of the source buffer.
        buf: u32,
        /// Number of bytes to write.
        len: u32,
    },
    /// `lseek(fd, offset, whence)`.
    Lseek {
        /// File descriptor.
        fd: u32,
        /// Signed offset.
        offset: i32,
        /// GDB File-I/O `whence` value.
        whence: u32,
    },
    /// `unlink(path)`. `path_len` includes the NUL terminator.
    Unlink {
        /// Address of the path string.
        path: u32,
        /// Length of the path string, including the NUL terminator.
        path_len: u32,
    },
}

/// Platform Extension - Semihosting.
pub trait Semihost {
    /// Whether the current `SIGTRAP` was caused by a semihosting call (as
    /// opposed to a breakpoint or a completed single-step).
    fn is_semihost_call(&mut self) -> bool;

    /// Decode the semihosting call at the current program counter.
    ///
    /// Returning `None` (e.g: for an operation the platform doesn't forward)
    /// makes the monitor report the trap to the host as a regular stop.
    fn semihost_request(&mut self) -> Option<SemihostRequest>;

    /// Hand the host's answer back to the program, e.g: by writing `ret` to
    /// `r0` and `errno` to wherever the C library expects it.
    ///
    /// Called right after the monitor has advanced the program counter past
    /// the semihosting call.
    fn set_semihost_return(&mut self, ret: i32, errno: i32);
}

define_ext!(SemihostOps, Semihost);
