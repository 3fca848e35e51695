//! Set/Remove hardware breakpoints and watchpoints.

use crate::platform::PlatformResult;

/// Platform Extension - Set/Remove hardware breakpoints.
///
/// Besides backing GDB's `Z1`/`z1` (and, since a debug monitor cannot patch
/// flash with breakpoint instructions, `Z0`/`z0`) packets, this extension is
/// what the monitor's temporary breakpoint is built on.
pub trait Breakpoints {
    /// Arm a hardware breakpoint on `addr`.
    /// Return `Ok(false)` if no comparator is free.
    fn set_hw_breakpoint(&mut self, addr: u32) -> PlatformResult<bool>;

    /// Disarm the hardware breakpoint on `addr`.
    /// Return `Ok(false)` if there is no breakpoint on `addr`.
    fn clear_hw_breakpoint(&mut self, addr: u32) -> PlatformResult<bool>;

    /// Arm a hardware breakpoint on `addr`, for an instruction of the given
    /// GDB breakpoint `kind` (on ARM: 2 for a 16-bit Thumb instruction, 3 for
    /// a 32-bit Thumb-2 instruction, 4 for an ARM instruction).
    ///
    /// Defaults to ignoring `kind`.
    fn set_hw_breakpoint_of_kind(&mut self, addr: u32, kind: u32) -> PlatformResult<bool> {
        let _ = kind;
        self.set_hw_breakpoint(addr)
    }

    /// Disarm a hardware breakpoint armed with
    /// [`set_hw_breakpoint_of_kind`](Self::set_hw_breakpoint_of_kind).
    ///
    /// Defaults to ignoring `kind`.
    fn clear_hw_breakpoint_of_kind(&mut self, addr: u32, kind: u32) -> PlatformResult<bool> {
        let _ = kind;
        self.clear_hw_breakpoint(addr)
    }

    /// Support for hardware watchpoints.
    #[inline(always)]
    fn support_hw_watchpoint(&mut self) -> Option<HwWatchpointOps<'_>> {
        None
    }
}

define_ext!(BreakpointsOps, Breakpoints);

/// The kind of watchpoint that should be set/removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchKind {
    /// Fire when the memory location is written to.
    Write,
    /// Fire when the memory location is read from.
    Read,
    /// Fire when the memory location is written to and/or read from.
    ReadWrite,
}

impl WatchKind {
    pub(crate) fn from_z_type(type_: u8) -> Option<WatchKind> {
        match type_ {
            2 => Some(WatchKind::Write),
            3 => Some(WatchKind::Read),
            4 => Some(WatchKind::ReadWrite),
            _ => None,
        }
    }

    /// The stop reply field naming this kind of watchpoint hit.
    pub(crate) fn stop_reason_name(self) -> &'static str {
        match self {
            WatchKind::Write => "watch",
            WatchKind::Read => "rwatch",
            WatchKind::ReadWrite => "awatch",
        }
    }
}

/// Nested Platform Extension - Set/Remove hardware watchpoints.
///
/// See the [GDB documentation](https://sourceware.org/gdb/current/onlinedocs/gdb/Set-Watchpoints.html)
/// regarding watchpoints for how they're supposed to work.
pub trait HwWatchpoint {
    /// Arm a watchpoint covering `len` bytes at `addr`.
    /// Return `Ok(false)` if no comparator is free, or if the platform can't
    /// watch a region of that size/alignment.
    fn set_hw_watchpoint(&mut self, addr: u32, len: u32, kind: WatchKind) -> PlatformResult<bool>;

    /// Disarm a watchpoint previously armed by
    /// [`set_hw_watchpoint`](Self::set_hw_watchpoint).
    /// Return `Ok(false)` if there is no such watchpoint.
    fn clear_hw_watchpoint(&mut self, addr: u32, len: u32, kind: WatchKind)
        -> PlatformResult<bool>;
}

define_ext!(HwWatchpointOps, HwWatchpoint);
