use super::prelude::*;

use log::*;

use crate::platform::breakpoints::WatchKind;

enum CmdKind {
    Add,
    Remove,
}

impl<P: Platform, C: ConnectionExt> MonitorImpl<P, C> {
    /// `Z<type>,<addr>,<kind>` and `z<type>,<addr>,<kind>`.
    pub(crate) fn handle_breakpoints(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
        insert: bool,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let cmd_kind = match insert {
            true => CmdKind::Add,
            false => CmdKind::Remove,
        };

        let type_: u8 = buf.read_hex()?;
        buf.expect_char(b',')?;
        let addr: u32 = buf.read_hex()?;
        buf.expect_char(b',')?;
        let kind: u32 = buf.read_hex()?;

        // an empty reply tells GDB the request isn't supported
        buf.reset();

        let ops = match platform.support_breakpoints() {
            Some(ops) => ops,
            None => return Ok(HandlerStatus::REPLY),
        };

        let supported = match type_ {
            0 | 1 => match cmd_kind {
                CmdKind::Add => ops.set_hw_breakpoint_of_kind(addr, kind),
                CmdKind::Remove => ops.clear_hw_breakpoint_of_kind(addr, kind),
            },
            2 | 3 | 4 => {
                let ops = match ops.support_hw_watchpoint() {
                    Some(ops) => ops,
                    None => return Ok(HandlerStatus::REPLY),
                };
                let watch_kind = match WatchKind::from_z_type(type_) {
                    Some(kind) => kind,
                    None => return Ok(HandlerStatus::REPLY),
                };
                // for watchpoints, `kind` is the length of the watched region
                match cmd_kind {
                    CmdKind::Add => ops.set_hw_watchpoint(addr, kind, watch_kind),
                    CmdKind::Remove => ops.clear_hw_watchpoint(addr, kind, watch_kind),
                }
            }
            // warn if the GDB client ever sends a type outside the known types
            other => {
                warn!("unknown breakpoint type: {}", other);
                return Ok(HandlerStatus::REPLY);
            }
        };

        let failure_code = match cmd_kind {
            CmdKind::Add => reply_code::NO_FREE_BREAKPOINT,
            CmdKind::Remove => reply_code::INVALID_ARGUMENT,
        };

        match supported.or_reply(failure_code)? {
            true => {
                buf.write_str("OK");
                Ok(HandlerStatus::REPLY)
            }
            false => Err(ErrorReply(failure_code).into()),
        }
    }
}
