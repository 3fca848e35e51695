//! Common types and definitions used across `gdbmon`.

mod signal;

pub use self::signal::Signal;

/// GDB's `EINTR` errno value, as used in File-I/O replies.
pub const EINTR: i32 = 4;
