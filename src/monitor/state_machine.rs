//! The debug exception entry point.
//!
//! Every trap into the monitor runs through the same cycle:
//!
//! ```text
//!            trap
//! (running) ------> [entered] --> spurious transport interrupt ----> (running)
//!                       |     --> temp breakpoint, callback resumes -> (running)
//!                       v
//!              entering-debugger hooks
//!                       |
//!                       v
//!                 [semihosting?] --- request forwarded ------------+
//!                       |                                          |
//!                       v                                          |
//!          fault info + stop reply, then [dispatching]             |
//!                       |                                          |
//!                       v                                          v
//!              leaving-debugger hooks ------------------------> (running)
//! ```
//!
//! The spurious-interrupt, temporary breakpoint, and semihosting paths never
//! send a stop reply: as far as the host is concerned, the program never
//! stopped.

use log::*;

use crate::buffer::Buffer;
use crate::common::Signal;
use crate::conn::ConnectionExt;
use crate::monitor::console::ConsoleOutput;
use crate::monitor::core_impl::MonitorImpl;
use crate::monitor::{Monitor, MonitorError as Error};
use crate::platform::Platform;

impl<'a, P: Platform, C: ConnectionExt> Monitor<'a, P, C> {
    /// Handle a debug exception.
    ///
    /// Call this from every exception handler which should stop in the
    /// debugger (debug monitor, hard fault, bus fault, the transport's
    /// receive interrupt, ...), with the interrupted program's context saved
    /// where `platform` can find it. Returns once the program should be
    /// resumed.
    ///
    /// The only errors are transport failures, which abort the session.
    pub fn debug_exception(&mut self, platform: &mut P) -> Result<(), Error<C::Error>> {
        if !self.inner.state.is_initialized() {
            warn!("ignoring debug exception: monitor was never successfully initialized");
            return Ok(());
        }

        let just_stepped = platform.is_single_stepping();

        if self.conn.caused_interrupt() && self.conn.peek().map_err(Error::ConnectionRead)?.is_none()
        {
            debug!("spurious transport interrupt, resuming");
            self.conn.clear_interrupt();
            return Ok(());
        }

        let inner = &mut self.inner;
        if inner.temp_bp.was_hit(platform.program_counter()) {
            if let Some(armed) = inner.temp_bp.clear(platform.support_breakpoints()) {
                debug!("hit temporary breakpoint at {:#010x}", armed.addr);
                if (armed.callback)(platform, armed.context) {
                    return Ok(());
                }
            }
        }

        inner.state.start_session();
        inner.hooks.entering();
        platform.entering_debugger();

        inner.state.signal = platform.cause_of_exception(inner.state.is_first_exception());
        debug!("entering debugger: {}", inner.state.signal);

        let res = inner.debug_session(&mut self.conn, &mut self.buffer, platform, just_stepped);

        platform.leaving_debugger();
        inner.hooks.leaving();
        inner.state.clear_first_exception();
        debug!("leaving debugger");

        res
    }
}

impl<P: Platform, C: ConnectionExt> MonitorImpl<P, C> {
    fn debug_session(
        &mut self,
        conn: &mut C,
        buf: &mut Buffer<'_>,
        platform: &mut P,
        just_stepped: bool,
    ) -> Result<(), Error<C::Error>> {
        if self.state.signal == Signal::SIGTRAP && self.is_semihost_call(platform) {
            // The request is forwarded even when single-stepping onto the
            // call. In that case the step still gets reported afterwards.
            let handled = self.handle_semihost_request(conn, buf, platform)?;
            if handled && !just_stepped {
                return Ok(());
            }
        }

        let mut console = ConsoleOutput::new(conn, &mut self.codec, buf);
        let _ = platform.display_fault_cause(&mut console);
        console.finish()?;

        self.write_stop_reply(buf, platform);
        self.send_packet(conn, buf)?;

        self.command_loop(conn, buf, platform)
    }

    fn is_semihost_call(&mut self, platform: &mut P) -> bool {
        match platform.support_semihosting() {
            Some(ops) => ops.is_semihost_call(),
            None => false,
        }
    }
}
