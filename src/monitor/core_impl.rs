use core::marker::PhantomData;

use log::*;

use crate::buffer::Buffer;
use crate::conn::ConnectionExt;
use crate::monitor::error::MonitorError as Error;
use crate::monitor::state::MonitorState;
use crate::monitor::temp_breakpoint::TempBreakpoint;
use crate::platform::Platform;
use crate::protocol::commands::CommandKind;
use crate::protocol::packet::PacketCodec;

/// Common imports used by >50% of all command handlers.
///
/// Do not clutter this prelude with types only used by a few handlers.
mod prelude {
    pub(super) use crate::buffer::Buffer;
    pub(super) use crate::conn::ConnectionExt;
    pub(super) use crate::monitor::core_impl::platform_result_ext::PlatformResultExt;
    pub(super) use crate::monitor::core_impl::reply_code;
    pub(super) use crate::monitor::core_impl::HandlerStatus;
    pub(super) use crate::monitor::core_impl::MonitorImpl;
    pub(super) use crate::monitor::error::ErrorReply;
    pub(super) use crate::monitor::error::MonitorError as Error;
    pub(super) use crate::platform::Platform;
}

mod base;
mod breakpoints;
mod file_io;
mod query;
mod resume;

/// Error codes sent back to the host as `Exx` replies.
pub(crate) mod reply_code {
    /// The reply (or the request) didn't fit in the packet buffer.
    pub const BUFFER_OVERRUN: u8 = 0x00;
    /// Malformed command arguments.
    pub const INVALID_ARGUMENT: u8 = 0x01;
    /// The platform ran out of hardware breakpoint/watchpoint comparators.
    pub const NO_FREE_BREAKPOINT: u8 = 0x02;
    /// A memory access faulted.
    pub const MEMORY_ACCESS_FAILURE: u8 = 0x03;
}

pub(crate) mod platform_result_ext {
    use crate::monitor::error::ErrorReply;
    use crate::platform::{PlatformError, PlatformResult};

    /// Extension trait to ease working with `PlatformResult` in the command
    /// handlers.
    pub(crate) trait PlatformResultExt<V> {
        /// Turn a platform failure into an `Exx` reply, using the platform's
        /// own errno if it supplied one, and `fallback` otherwise.
        fn or_reply(self, fallback: u8) -> Result<V, ErrorReply>;
    }

    impl<V> PlatformResultExt<V> for PlatformResult<V> {
        fn or_reply(self, fallback: u8) -> Result<V, ErrorReply> {
            let code = match self {
                Ok(v) => return Ok(v),
                Err(PlatformError::NonFatal) => fallback,
                Err(PlatformError::Errno(code)) => code,
            };

            Err(ErrorReply(code))
        }
    }
}

/// What the dispatcher should do once a handler returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct HandlerStatus(u8);

bitflags::bitflags! {
    impl HandlerStatus: u8 {
        /// Leave the command loop and resume the program.
        const RESUME_PROGRAM = 1 << 0;
        /// The handler has already done all the talking it needs to, so the
        /// buffer must not be sent as a reply.
        const RETURN_IMMEDIATELY = 1 << 1;

        /// Resume right away, without replying (`c`, `s`, ...).
        const RESUME = Self::RESUME_PROGRAM.bits() | Self::RETURN_IMMEDIATELY.bits();
    }
}

impl HandlerStatus {
    /// Send the buffer as the reply and keep looping.
    pub const REPLY: HandlerStatus = HandlerStatus::empty();
}

/// Optional callbacks run around every debug session.
#[derive(Clone, Copy, Default)]
pub(crate) struct DebuggerHooks {
    pub entering: Option<fn()>,
    pub leaving: Option<fn()>,
}

impl DebuggerHooks {
    pub fn entering(&self) {
        if let Some(hook) = self.entering {
            hook()
        }
    }

    pub fn leaving(&self) {
        if let Some(hook) = self.leaving {
            hook()
        }
    }
}

pub(crate) struct MonitorImpl<P, C> {
    _connection: PhantomData<C>,

    pub codec: PacketCodec,
    pub state: MonitorState,
    pub temp_bp: TempBreakpoint<P>,
    pub hooks: DebuggerHooks,
}

impl<P: Platform, C: ConnectionExt> MonitorImpl<P, C> {
    pub fn new(hooks: DebuggerHooks) -> MonitorImpl<P, C> {
        MonitorImpl {
            _connection: PhantomData,

            codec: PacketCodec::new(),
            state: MonitorState::new(),
            temp_bp: TempBreakpoint::new(),
            hooks,
        }
    }

    /// Handle commands until one of them resumes the program.
    pub fn command_loop(
        &mut self,
        conn: &mut C,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<(), Error<C::Error>> {
        while !self.handle_one_command(conn, buf, platform)? {}
        Ok(())
    }

    /// Receive, dispatch, and (usually) answer a single command. Returns
    /// whether the program should be resumed.
    pub fn handle_one_command(
        &mut self,
        conn: &mut C,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<bool, Error<C::Error>> {
        self.codec.recv(conn, buf)?;
        self.latch_interrupt();

        let status = if buf.overrun_detected() {
            warn!(
                "packet does not fit in the {} byte packet buffer",
                buf.capacity()
            );
            write_error_reply(buf, reply_code::BUFFER_OVERRUN);
            HandlerStatus::REPLY
        } else {
            match buf.read_char().ok().and_then(CommandKind::from_command_char) {
                Some(kind) => match self.handle_command(buf, platform, kind) {
                    Ok(status) => status,
                    Err(Error::NonFatalError(code)) => {
                        debug!("{:?} failed with E{:02x}", kind, code);
                        write_error_reply(buf, code);
                        HandlerStatus::REPLY
                    }
                    Err(e) => return Err(e),
                },
                None => {
                    info!("Unknown command: {:?}", core::str::from_utf8(buf.as_slice()));
                    buf.reset();
                    HandlerStatus::REPLY
                }
            }
        };

        let resume = status.contains(HandlerStatus::RESUME_PROGRAM);
        if !status.contains(HandlerStatus::RETURN_IMMEDIATELY) {
            self.send_packet(conn, buf)?;
        }
        Ok(resume)
    }

    fn handle_command(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
        kind: CommandKind,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        // `handle_X` methods are defined in the submodules
        match kind {
            CommandKind::StopReason => self.handle_stop_reason(buf, platform),
            CommandKind::ReadRegisters => self.handle_read_registers(buf, platform),
            CommandKind::WriteRegisters => self.handle_write_registers(buf, platform),
            CommandKind::ReadMemory => self.handle_read_memory(buf, platform),
            CommandKind::WriteMemory => self.handle_write_memory(buf, platform),
            CommandKind::WriteBinaryMemory => self.handle_write_binary_memory(buf, platform),
            CommandKind::Continue => self.handle_resume(buf, platform, false, false),
            CommandKind::ContinueWithSignal => self.handle_resume(buf, platform, false, true),
            CommandKind::Step => self.handle_resume(buf, platform, true, false),
            CommandKind::StepWithSignal => self.handle_resume(buf, platform, true, true),
            CommandKind::InsertBreakpoint => self.handle_breakpoints(buf, platform, true),
            CommandKind::RemoveBreakpoint => self.handle_breakpoints(buf, platform, false),
            CommandKind::Query => self.handle_query(buf, platform),
            CommandKind::FileIo => self.handle_file_io(buf, platform),
        }
    }

    /// Send the buffer's contents to the host, substituting an error reply if
    /// the buffer overran while the reply was being built.
    pub fn send_packet(&mut self, conn: &mut C, buf: &mut Buffer<'_>) -> Result<(), Error<C::Error>> {
        if buf.overrun_detected() {
            warn!("reply does not fit in the packet buffer");
            write_error_reply(buf, reply_code::BUFFER_OVERRUN);
        }

        self.codec.send(conn, buf.as_slice())?;
        self.latch_interrupt();
        Ok(())
    }

    fn latch_interrupt(&mut self) {
        if self.codec.take_interrupt() {
            self.state.set_control_c_received(true);
        }
    }
}

fn write_error_reply(buf: &mut Buffer<'_>, code: u8) {
    buf.reset();
    buf.write_char('E');
    buf.write_byte_as_hex(code);
}
