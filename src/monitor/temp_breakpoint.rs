//! A single host-invisible, one-shot hardware breakpoint.

use log::*;

use crate::platform::breakpoints::Breakpoints;

/// Called when the temporary breakpoint is hit, with the `context` value it
/// was armed with. Return `true` to resume the program without involving the
/// host, or `false` to stop and report the trap as usual.
pub type TempBreakpointCallback<P> = fn(platform: &mut P, context: usize) -> bool;

/// Strip the Thumb execution-mode bit from a code address.
#[inline(always)]
pub(crate) fn clear_thumb_bit(addr: u32) -> u32 {
    addr & !1
}

pub(crate) struct Armed<P> {
    pub addr: u32,
    pub callback: TempBreakpointCallback<P>,
    pub context: usize,
}

/// The temporary breakpoint slot.
///
/// The address, callback, and context are stored together in an `Option`, so
/// the slot is either fully armed or fully cleared.
pub(crate) struct TempBreakpoint<P> {
    armed: Option<Armed<P>>,
}

impl<P> TempBreakpoint<P> {
    pub fn new() -> TempBreakpoint<P> {
        TempBreakpoint { armed: None }
    }

    #[inline(always)]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Arm the breakpoint on `addr`.
    ///
    /// Fails if the slot is already taken, if the platform doesn't support
    /// hardware breakpoints, or if the platform can't arm one. The slot is
    /// left untouched on failure.
    pub fn arm(
        &mut self,
        ops: Option<&mut dyn Breakpoints>,
        addr: u32,
        callback: TempBreakpointCallback<P>,
        context: usize,
    ) -> bool {
        if self.armed.is_some() {
            debug!("temporary breakpoint already armed");
            return false;
        }

        let ops = match ops {
            Some(ops) => ops,
            None => {
                warn!("temporary breakpoint requires hardware breakpoint support");
                return false;
            }
        };

        let addr = clear_thumb_bit(addr);
        match ops.set_hw_breakpoint(addr) {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                debug!("failed to arm temporary breakpoint at {:#010x}", addr);
                return false;
            }
        }

        self.armed = Some(Armed {
            addr,
            callback,
            context,
        });
        true
    }

    /// Whether the armed breakpoint is the one at `pc`.
    pub fn was_hit(&self, pc: u32) -> bool {
        match &self.armed {
            Some(armed) => clear_thumb_bit(pc) == armed.addr,
            None => false,
        }
    }

    /// Disarm the breakpoint, returning what it was armed with.
    ///
    /// The slot is freed even if the platform fails to remove the hardware
    /// breakpoint.
    pub fn clear(&mut self, ops: Option<&mut dyn Breakpoints>) -> Option<Armed<P>> {
        let armed = self.armed.take()?;

        let removed = match ops {
            Some(ops) => matches!(ops.clear_hw_breakpoint(armed.addr), Ok(true)),
            None => false,
        };
        if !removed {
            warn!(
                "failed to remove temporary breakpoint at {:#010x}",
                armed.addr
            );
        }

        Some(armed)
    }
}
