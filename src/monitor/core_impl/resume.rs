use super::prelude::*;

use log::*;

use crate::platform::InstructionKind;

impl<P: Platform, C: ConnectionExt> MonitorImpl<P, C> {
    /// `c[addr]`, `C<sig>[;addr]`, `s[addr]`, and `S<sig>[;addr]`.
    pub(crate) fn handle_resume(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
        step: bool,
        with_signal: bool,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let addr = if with_signal {
            // There's no way to deliver a signal to a bare-metal program, so
            // the signal is only parsed to get at the (optional) address.
            let signal: u8 = buf.read_hex()?;
            debug!("ignoring resume signal {}", signal);
            match buf.is_next_char(b';') {
                true => Some(buf.read_hex::<u32>()?),
                false => None,
            }
        } else {
            match buf.bytes_left() {
                0 => None,
                _ => Some(buf.read_hex::<u32>()?),
            }
        };

        let pc_modified = self.state.pc_modified();
        self.state.set_pc_modified(false);

        match addr {
            Some(addr) => platform.set_program_counter(addr),
            // A PC moved by `G` is left alone, even on a breakpoint instruction.
            None if pc_modified => {}
            // Resuming on top of a breakpoint instruction compiled into the
            // program would trap right back into the monitor.
            None => {
                if platform.current_instruction() == InstructionKind::HardcodedBreakpoint {
                    debug!(
                        "skipping hardcoded breakpoint at {:#010x}",
                        platform.program_counter()
                    );
                    platform.advance_program_counter();
                }
            }
        }

        if step {
            platform.enable_single_step();
        } else {
            platform.disable_single_step();
        }

        Ok(HandlerStatus::RESUME)
    }
}
