/// Signal numbers reported to GDB in stop replies.
///
/// These are GDB's own cross-platform signal numbers (see
/// <https://github.com/bminor/binutils-gdb/blob/master/include/gdb/signals.def>),
/// not the host OS's. Only the handful a bare-metal core can actually raise are
/// named here; any other value can still be built with `Signal(n)`.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(pub u8);

#[allow(clippy::upper_case_acronyms)]
#[rustfmt::skip]
impl Signal {
    #[doc = "Signal 0 (shouldn't be used)"]    pub const SIGZERO: Self = Self(0);
    #[doc = "Interrupt"]                       pub const SIGINT:  Self = Self(2);
    #[doc = "Illegal instruction"]             pub const SIGILL:  Self = Self(4);
    #[doc = "Trace/breakpoint trap"]           pub const SIGTRAP: Self = Self(5);
    #[doc = "Aborted"]                         pub const SIGABRT: Self = Self(6);
    #[doc = "Arithmetic exception"]            pub const SIGFPE:  Self = Self(8);
    #[doc = "Bus error"]                       pub const SIGBUS:  Self = Self(10);
    #[doc = "Segmentation fault"]              pub const SIGSEGV: Self = Self(11);
    #[doc = "Bad system call"]                 pub const SIGSYS:  Self = Self(12);
    #[doc = "Stopped (signal)"]                pub const SIGSTOP: Self = Self(17);
}

impl core::fmt::Display for Signal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        #[rustfmt::skip]
        let s = match *self {
            Signal::SIGZERO => "SIGZERO - Signal 0",
            Signal::SIGINT  => "SIGINT - Interrupt",
            Signal::SIGILL  => "SIGILL - Illegal instruction",
            Signal::SIGTRAP => "SIGTRAP - Trace/breakpoint trap",
            Signal::SIGABRT => "SIGABRT - Aborted",
            Signal::SIGFPE  => "SIGFPE - Arithmetic exception",
            Signal::SIGBUS  => "SIGBUS - Bus error",
            Signal::SIGSEGV => "SIGSEGV - Segmentation fault",
            Signal::SIGSYS  => "SIGSYS - Bad system call",
            Signal::SIGSTOP => "SIGSTOP - Stopped (signal)",
            _ => return write!(f, "signal {}", self.0),
        };

        write!(f, "{}", s)
    }
}
