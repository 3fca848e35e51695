//! The [`Platform`] trait and its optional extension traits.
//!
//! A `Platform` is everything the monitor needs from the core it is running
//! on: access to the register context saved by the exception entry code,
//! memory access, single-stepping, and a way to decode why the core trapped.
//!
//! Optional functionality is exposed using the same "inlineable dyn extension
//! trait" pattern used throughout `gdbmon`: a `support_xyz` method which
//! returns `None` by default, and which a platform overrides to return
//! `Some(self)` once it implements the corresponding extension trait.
//!
//! ```rust,ignore
//! impl Platform for MyCore {
//!     // ...
//!     fn support_breakpoints(&mut self) -> Option<BreakpointsOps<'_>> {
//!         Some(self)
//!     }
//! }
//!
//! impl Breakpoints for MyCore {
//!     // ...
//! }
//! ```

use core::fmt;

use crate::common::Signal;

macro_rules! define_ext {
    ($extname:ident, $exttrait:ident) => {
        #[doc = concat!("See [`", stringify!($exttrait), "`].")]
        pub type $extname<'a> = &'a mut dyn $exttrait;
    };
}

pub mod breakpoints;
pub mod semihost;

use self::breakpoints::{BreakpointsOps, WatchKind};
use self::semihost::SemihostOps;

/// A recoverable error raised by a platform operation.
///
/// Platform failures are never fatal to the debug session: the monitor
/// reports them to the host as an `Exx` reply and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// A generic failure. The monitor picks an error code appropriate for the
    /// command which triggered it (e.g: `E03` for a faulting memory access).
    NonFatal,
    /// A failure with an explicit errno-style code, reported to the host
    /// verbatim.
    Errno(u8),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::NonFatal => write!(f, "platform operation failed"),
            PlatformError::Errno(code) => write!(f, "platform operation failed (errno {})", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlatformError {}

/// A result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// What the instruction at the current program counter is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    /// A breakpoint instruction compiled into the program (e.g: `bkpt` on
    /// ARM). Resuming from one of these must skip over it, otherwise the
    /// target would trap straight back into the monitor.
    HardcodedBreakpoint,
    /// Anything else.
    Other,
}

/// Additional detail about a `SIGTRAP` stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapReason {
    /// A hardware watchpoint fired on `addr`.
    Watchpoint {
        /// The kind of access which fired.
        kind: WatchKind,
        /// The data address which was accessed.
        addr: u32,
    },
    /// Breakpoint, single-step completion, or anything else without extra
    /// detail.
    Other,
}

/// The core the monitor is running on.
///
/// All methods are called from the exception context which entered the
/// monitor, with the interrupted program's register state saved in the
/// [`context`](Platform::context).
pub trait Platform {
    /// One-time platform setup (e.g: configuring debug exception priorities,
    /// enabling the debug monitor exception).
    ///
    /// The monitor refuses to handle debug exceptions until this has
    /// succeeded.
    fn init(&mut self) -> PlatformResult<()> {
        Ok(())
    }

    /// The interrupted program's register context, exactly as it should be
    /// reported to GDB in response to a `g` packet.
    fn context(&self) -> &[u8];

    /// Mutable access to the register context. Writes land in the program's
    /// registers when the monitor returns.
    fn context_mut(&mut self) -> &mut [u8];

    /// Read the program counter.
    fn program_counter(&self) -> u32;

    /// Write the program counter.
    fn set_program_counter(&mut self, pc: u32);

    /// Move the program counter past the current instruction.
    fn advance_program_counter(&mut self);

    /// Decode the instruction at the current program counter.
    fn current_instruction(&mut self) -> InstructionKind {
        InstructionKind::Other
    }

    /// Report the registers included in a `T` stop reply (typically the frame
    /// pointer, stack pointer, link register and program counter), by calling
    /// `write_reg(gdb_regnum, value)` once per register.
    fn write_stop_registers(&self, write_reg: &mut dyn FnMut(u8, u32));

    /// Read target memory into `data`. Must fail (instead of faulting) if the
    /// range is inaccessible.
    fn read_memory(&mut self, addr: u32, data: &mut [u8]) -> PlatformResult<()>;

    /// Write `data` to target memory. Must fail (instead of faulting) if the
    /// range is inaccessible.
    fn write_memory(&mut self, addr: u32, data: &[u8]) -> PlatformResult<()>;

    /// Arm single-instruction stepping for the next resume.
    fn enable_single_step(&mut self);

    /// Disarm single-instruction stepping.
    fn disable_single_step(&mut self);

    /// Whether single-instruction stepping is currently armed.
    fn is_single_stepping(&self) -> bool;

    /// Determine the signal describing why the core trapped.
    ///
    /// `is_first_exception` is set for the first exception after
    /// [`Monitor::init`](crate::Monitor::init), which platforms typically
    /// report as a plain `SIGTRAP` regardless of cause.
    fn cause_of_exception(&mut self, is_first_exception: bool) -> Signal;

    /// Extra detail for `SIGTRAP` stops.
    fn trap_reason(&self) -> TrapReason {
        TrapReason::Other
    }

    /// Describe the fault which caused the current exception (if any) on the
    /// GDB console. Called once per stop, before the stop reply is sent.
    fn display_fault_cause(&mut self, console: &mut dyn fmt::Write) -> fmt::Result {
        let _ = console;
        Ok(())
    }

    /// Called right before the monitor starts talking to the host.
    ///
    /// Platforms can use this to quiesce peripherals or save debug state.
    fn entering_debugger(&mut self) {}

    /// Called right before the monitor returns to the interrupted program.
    fn leaving_debugger(&mut self) {}

    /// The device's memory map, served verbatim over
    /// `qXfer:memory-map:read`.
    fn memory_map_xml(&self) -> Option<&'static str> {
        None
    }

    /// The target's register description, served verbatim over
    /// `qXfer:features:read:target.xml`.
    fn target_xml(&self) -> Option<&'static str> {
        None
    }

    /// Support for hardware breakpoints and watchpoints.
    #[inline(always)]
    fn support_breakpoints(&mut self) -> Option<BreakpointsOps<'_>> {
        None
    }

    /// Support for semihosting requests forwarded to the host.
    #[inline(always)]
    fn support_semihosting(&mut self) -> Option<SemihostOps<'_>> {
        None
    }
}
