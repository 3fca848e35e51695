use crate::common::Signal;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct MonitorFlags(u8);

bitflags::bitflags! {
    impl MonitorFlags: u8 {
        const SUCCESSFUL_INIT = 1 << 0;
        const FIRST_EXCEPTION = 1 << 1;
        const CONTROL_C = 1 << 2;
        const PC_MODIFIED = 1 << 3;
    }
}

/// Everything the monitor remembers between (and during) debug exceptions.
///
/// The armed temporary breakpoint lives in
/// [`TempBreakpoint`](super::temp_breakpoint::TempBreakpoint), which keeps its
/// own "armed" state together with the address and callback.
#[derive(Debug)]
pub(crate) struct MonitorState {
    flags: MonitorFlags,
    pub signal: Signal,
    pub semihost_return_code: i32,
    pub semihost_errno: i32,
}

impl MonitorState {
    pub fn new() -> MonitorState {
        MonitorState {
            flags: MonitorFlags::empty(),
            signal: Signal::SIGZERO,
            semihost_return_code: 0,
            semihost_errno: 0,
        }
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.flags.contains(MonitorFlags::SUCCESSFUL_INIT)
    }

    /// Mark a successful `init`. The next exception is the first one.
    pub fn set_initialized(&mut self) {
        self.flags
            .insert(MonitorFlags::SUCCESSFUL_INIT | MonitorFlags::FIRST_EXCEPTION);
    }

    #[inline(always)]
    pub fn is_first_exception(&self) -> bool {
        self.flags.contains(MonitorFlags::FIRST_EXCEPTION)
    }

    #[inline(always)]
    pub fn clear_first_exception(&mut self) {
        self.flags.remove(MonitorFlags::FIRST_EXCEPTION)
    }

    #[inline(always)]
    pub fn control_c_received(&self) -> bool {
        self.flags.contains(MonitorFlags::CONTROL_C)
    }

    #[inline(always)]
    pub fn set_control_c_received(&mut self, val: bool) {
        self.flags.set(MonitorFlags::CONTROL_C, val)
    }

    /// Whether the host moved the program counter (through `G`) since the
    /// program last resumed.
    #[inline(always)]
    pub fn pc_modified(&self) -> bool {
        self.flags.contains(MonitorFlags::PC_MODIFIED)
    }

    #[inline(always)]
    pub fn set_pc_modified(&mut self, val: bool) {
        self.flags.set(MonitorFlags::PC_MODIFIED, val)
    }

    /// Forget the host requests of the previous debug session.
    pub fn start_session(&mut self) {
        self.flags
            .remove(MonitorFlags::CONTROL_C | MonitorFlags::PC_MODIFIED);
    }

    pub fn set_semihost_return(&mut self, ret: i32, errno: i32) {
        self.semihost_return_code = ret;
        self.semihost_errno = errno;
    }

    /// The host answered the last semihosting request with `EINTR`, i.e: the
    /// user hit Ctrl-C before the host got around to servicing it.
    pub fn was_semihost_call_cancelled(&self) -> bool {
        self.semihost_errno == crate::common::EINTR
    }
}
