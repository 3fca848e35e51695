//! An implementation of the
//! [GDB Remote Serial Protocol](https://sourceware.org/gdb/onlinedocs/gdb/Remote-Protocol.html#Remote-Protocol)
//! that runs _inside_ the program being debugged.
//!
//! `gdbmon` is a debug monitor: instead of driving a target from the outside
//! (like an emulator's gdbstub, or a hardware debug probe), it is invoked from
//! the target's own debug/fault exception handlers. Whenever the core traps
//! into the monitor, it takes over the CPU, talks to a host GDB over a
//! byte-oriented transport (typically a UART), and eventually hands execution
//! back to the interrupted program.
//!
//! ## Integrating `gdbmon`
//!
//! 1. Implement [`conn::ConnectionExt`] for your transport.
//! 2. Implement [`platform::Platform`] for your core, optionally enabling the
//!    [`Breakpoints`](platform::breakpoints::Breakpoints) and
//!    [`Semihost`](platform::semihost::Semihost) extensions.
//! 3. Build a [`Monitor`] with [`MonitorBuilder`], call [`Monitor::init`], and
//!    call [`Monitor::debug_exception`] from every exception vector that
//!    should stop in the debugger.
//!
//! The monitor must never be re-entered: the exception priority scheme set up
//! by the platform has to guarantee that nothing routed to the monitor can
//! preempt it.
//!
//! ## Features
//!
//! - `alloc`: allow [`MonitorBuilder`] to heap-allocate the packet buffer.
//! - `std`: implements `std::error::Error` for the crate's error types.
//! - `trace-pkt`: log every packet sent/received at the `trace` level.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod protocol;

pub mod buffer;
pub mod common;
pub mod conn;
pub mod monitor;
pub mod platform;

pub use monitor::{packet_buffer_size, Monitor, MonitorBuilder, MonitorBuilderError, MonitorError};
