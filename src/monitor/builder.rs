use core::fmt::{self, Display};
use core::marker::PhantomData;

use managed::ManagedSlice;

use crate::buffer::Buffer;
use crate::conn::ConnectionExt;
use crate::platform::Platform;

use super::core_impl::{DebuggerHooks, MonitorImpl};
use super::Monitor;

/// The smallest packet buffer which can hold a `G` packet for a register
/// context of `context_len` bytes.
pub fn packet_buffer_size(context_len: usize) -> usize {
    1 + 2 * context_len
}

/// An error which may occur when building a [`Monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorBuilderError {
    /// Must provide buffer using `with_packet_buffer` in `#![no_std]` mode.
    MissingPacketBuffer,
    /// The buffer passed to `with_packet_buffer` can't hold a full register
    /// context write.
    PacketBufferTooSmall {
        /// Minimum size for the platform's register context.
        required: usize,
        /// Size of the buffer which was provided.
        provided: usize,
    },
}

impl Display for MonitorBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::MonitorBuilderError::*;
        match self {
            MissingPacketBuffer => write!(
                f,
                "Must provide buffer using `with_packet_buffer` in `#![no_std]` mode."
            ),
            PacketBufferTooSmall { required, provided } => write!(
                f,
                "Packet buffer is too small: the platform's register context needs {} bytes, but only {} were provided.",
                required, provided
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MonitorBuilderError {}

/// Helper to construct and customize [`Monitor`].
pub struct MonitorBuilder<'a, P: Platform, C: ConnectionExt> {
    conn: C,
    packet_buffer: Option<&'a mut [u8]>,
    hooks: DebuggerHooks,

    _platform: PhantomData<P>,
}

impl<'a, P: Platform, C: ConnectionExt> MonitorBuilder<'a, P, C> {
    /// Create a new `MonitorBuilder` using the provided Connection.
    pub fn new(conn: C) -> MonitorBuilder<'static, P, C> {
        MonitorBuilder {
            conn,
            packet_buffer: None,
            hooks: DebuggerHooks::default(),

            _platform: PhantomData,
        }
    }

    /// Use a pre-allocated packet buffer (instead of heap-allocating).
    ///
    /// The buffer must be at least [`packet_buffer_size`] bytes long for the
    /// platform's register context.
    ///
    /// _Note:_ This method is _required_ when the `alloc` feature is disabled!
    pub fn with_packet_buffer(mut self, packet_buffer: &'a mut [u8]) -> Self {
        self.packet_buffer = Some(packet_buffer);
        self
    }

    /// Run `hook` every time the monitor takes over the core, before it
    /// starts talking to the host (e.g: to stop a motor controller's PWM
    /// outputs while the program is halted).
    pub fn with_entering_debugger_hook(mut self, hook: fn()) -> Self {
        self.hooks.entering = Some(hook);
        self
    }

    /// Run `hook` every time the monitor hands the core back to the program.
    pub fn with_leaving_debugger_hook(mut self, hook: fn()) -> Self {
        self.hooks.leaving = Some(hook);
        self
    }

    /// Build the Monitor, returning an error if something went wrong.
    ///
    /// `platform` is only used to size the packet buffer. The monitor still
    /// needs to be [`init`](Monitor::init)'d before it will handle debug
    /// exceptions.
    pub fn build(self, platform: &P) -> Result<Monitor<'a, P, C>, MonitorBuilderError> {
        let required = packet_buffer_size(platform.context().len());

        let packet_buffer = match self.packet_buffer {
            Some(buf) => {
                if buf.len() < required {
                    return Err(MonitorBuilderError::PacketBufferTooSmall {
                        required,
                        provided: buf.len(),
                    });
                }
                ManagedSlice::Borrowed(buf)
            }
            None => {
                cfg_if::cfg_if! {
                    if #[cfg(feature = "alloc")] {
                        use alloc::vec;
                        ManagedSlice::Owned(vec![0; required])
                    } else {
                        return Err(MonitorBuilderError::MissingPacketBuffer);
                    }
                }
            }
        };

        Ok(Monitor {
            conn: self.conn,
            buffer: Buffer::new(packet_buffer),
            inner: MonitorImpl::new(self.hooks),
        })
    }
}
