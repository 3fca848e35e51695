use super::prelude::*;

use log::*;

use crate::common::Signal;

impl<P: Platform, C: ConnectionExt> MonitorImpl<P, C> {
    /// `F<ret>[,<errno>[,C]]`: the host's answer to a semihosting request.
    pub(crate) fn handle_file_io(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let ret = buf.read_int()?;
        let errno = match buf.is_next_char(b',') {
            true => buf.read_int()?,
            false => 0,
        };
        let control_c = buf.is_next_char(b',') && buf.is_next_char(b'C');

        debug!(
            "File-I/O reply: ret={} errno={} ctrl-c={}",
            ret, errno, control_c
        );
        self.state.set_semihost_return(ret, errno);
        self.state.set_control_c_received(control_c);

        if control_c {
            // Stop instead of resuming. The call only counts as handled if
            // the host actually got around to performing it.
            if !self.state.was_semihost_call_cancelled() {
                self.complete_semihost_call(platform);
            }
            self.state.signal = Signal::SIGINT;
            self.write_stop_reply(buf, platform);
            return Ok(HandlerStatus::REPLY);
        }

        self.complete_semihost_call(platform);
        Ok(HandlerStatus::RESUME)
    }

    /// Step over the semihosting call, and hand the host's answer back to the
    /// program.
    fn complete_semihost_call(&mut self, platform: &mut P) {
        platform.advance_program_counter();
        let (ret, errno) = (self.state.semihost_return_code, self.state.semihost_errno);
        match platform.support_semihosting() {
            Some(ops) => ops.set_semihost_return(ret, errno),
            None => warn!("got a File-I/O reply, but the platform doesn't support semihosting"),
        }
    }
}
