//! The [`Monitor`] type, which owns a debug session's transport, packet
//! buffer, and state across debug exceptions.

use log::*;

use crate::buffer::Buffer;
use crate::common::Signal;
use crate::conn::ConnectionExt;
use crate::platform::{Platform, PlatformResult};
use crate::protocol::packet::PacketCodec;

mod builder;
mod console;
mod core_impl;
mod error;
mod semihost;
mod state;
mod state_machine;
mod temp_breakpoint;

pub use builder::{packet_buffer_size, MonitorBuilder, MonitorBuilderError};
pub use error::MonitorError;
pub use temp_breakpoint::TempBreakpointCallback;

use self::console::ConsoleOutput;
use self::core_impl::MonitorImpl;
use self::state::MonitorState;

/// A GDB debug monitor for a [`Platform`], talking to the host over a given
/// [`ConnectionExt`].
///
/// There should be exactly one `Monitor` per core, living for as long as the
/// program runs. It is driven entirely from the platform's exception
/// handlers through [`debug_exception`](Self::debug_exception).
pub struct Monitor<'a, P: Platform, C: ConnectionExt> {
    conn: C,
    buffer: Buffer<'a>,
    inner: MonitorImpl<P, C>,
}

impl<'a, P: Platform, C: ConnectionExt> Monitor<'a, P, C> {
    /// Create a [`MonitorBuilder`] using the provided Connection.
    pub fn builder(conn: C) -> MonitorBuilder<'a, P, C> {
        MonitorBuilder::new(conn)
    }

    /// Initialize the platform.
    ///
    /// Debug exceptions are ignored until this has succeeded. The first
    /// exception after a successful `init` is flagged as such to
    /// [`Platform::cause_of_exception`].
    ///
    /// Every call starts over from a clean monitor: the temporary breakpoint
    /// is disarmed and all state is forgotten, even if the platform then
    /// fails to initialize.
    pub fn init(&mut self, platform: &mut P) -> PlatformResult<()> {
        self.inner.temp_bp.clear(platform.support_breakpoints());
        self.inner.state = MonitorState::new();
        self.inner.codec = PacketCodec::new();

        platform.init()?;
        self.inner.state.set_initialized();
        debug!("monitor initialized");
        Ok(())
    }

    /// Handle debug commands until one of them resumes the program.
    ///
    /// [`debug_exception`](Self::debug_exception) already does this as part
    /// of a regular stop. Calling it directly is only useful for driving the
    /// monitor from a custom exception flow.
    pub fn command_loop(&mut self, platform: &mut P) -> Result<(), MonitorError<C::Error>> {
        self.inner
            .command_loop(&mut self.conn, &mut self.buffer, platform)
    }

    /// Receive and handle a single command. Returns `true` if the command
    /// resumed the program.
    pub fn handle_one_command(&mut self, platform: &mut P) -> Result<bool, MonitorError<C::Error>> {
        self.inner
            .handle_one_command(&mut self.conn, &mut self.buffer, platform)
    }

    /// Arm the temporary breakpoint on `addr`.
    ///
    /// When the program hits it, the breakpoint is cleared and `callback` is
    /// called with `context`. If the callback returns `true` the program
    /// resumes straight away, and the host never hears about the stop.
    ///
    /// Returns `false` (without touching the existing breakpoint) if a
    /// temporary breakpoint is already armed, or if the platform can't arm a
    /// hardware breakpoint.
    pub fn arm_temp_breakpoint(
        &mut self,
        platform: &mut P,
        addr: u32,
        callback: TempBreakpointCallback<P>,
        context: usize,
    ) -> bool {
        self.inner
            .temp_bp
            .arm(platform.support_breakpoints(), addr, callback, context)
    }

    /// Disarm the temporary breakpoint. Returns whether one was armed.
    pub fn clear_temp_breakpoint(&mut self, platform: &mut P) -> bool {
        self.inner
            .temp_bp
            .clear(platform.support_breakpoints())
            .is_some()
    }

    /// Whether the temporary breakpoint is armed.
    pub fn temp_breakpoint_armed(&self) -> bool {
        self.inner.temp_bp.is_armed()
    }

    /// Whether [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.inner.state.is_initialized()
    }

    /// Whether no debug exception has been handled since [`init`](Self::init).
    pub fn is_first_exception(&self) -> bool {
        self.inner.state.is_first_exception()
    }

    /// Whether the host asked to interrupt the program during the current
    /// (or last) debug session, either with a raw Ctrl-C byte or through the
    /// `C` flag of a File-I/O reply. Cleared when the next session starts.
    pub fn control_c_received(&self) -> bool {
        self.inner.state.control_c_received()
    }

    /// The signal reported for the last debug exception.
    pub fn signal(&self) -> Signal {
        self.inner.state.signal
    }

    /// The `(return code, errno)` pair of the host's last File-I/O reply.
    pub fn semihost_return(&self) -> (i32, i32) {
        let state = &self.inner.state;
        (state.semihost_return_code, state.semihost_errno)
    }

    /// Whether the host cancelled the last semihosting call (i.e: answered it
    /// with `EINTR`).
    pub fn was_semihost_call_cancelled(&self) -> bool {
        self.inner.state.was_semihost_call_cancelled()
    }

    /// Print `msg` on the GDB console.
    ///
    /// GDB accepts console output while it waits for the program to stop, so
    /// this can be called from regular program code as well as from inside a
    /// debug session.
    pub fn send_console_output(&mut self, msg: &str) -> Result<(), MonitorError<C::Error>> {
        ConsoleOutput::new(&mut self.conn, &mut self.inner.codec, &mut self.buffer)
            .write_raw(msg.as_bytes())
    }

    /// Return a mutable reference to the underlying connection.
    pub fn borrow_conn(&mut self) -> &mut C {
        &mut self.conn
    }
}
