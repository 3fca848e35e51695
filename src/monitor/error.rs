use core::fmt::{self, Debug, Display};

use crate::buffer::BufferError;

/// An error which aborts a debug session.
///
/// A debug monitor has very few ways to fail: every protocol or platform
/// problem is reported to the host and the session carries on. The only
/// thing that cannot be recovered from is the transport itself failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MonitorError<C> {
    /// Connection Error while reading a packet or an acknowledgement.
    ConnectionRead(C),
    /// Connection Error while writing a packet or an acknowledgement.
    ConnectionWrite(C),

    // Internal - A non-fatal error occurred (with an `Exx` reply code)
    //
    // Command handlers bail out with this using `?`, and the dispatcher turns
    // it into an error reply. It is never propagated up to the end user.
    #[doc(hidden)]
    NonFatalError(u8),
}

/// An `Exx` reply code, raised by command handlers with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ErrorReply(pub u8);

impl<C> From<ErrorReply> for MonitorError<C> {
    fn from(e: ErrorReply) -> Self {
        MonitorError::NonFatalError(e.0)
    }
}

impl<C> From<BufferError> for MonitorError<C> {
    fn from(e: BufferError) -> Self {
        use crate::monitor::core_impl::reply_code;

        let code = match e {
            BufferError::Overrun | BufferError::InvalidHex | BufferError::UnexpectedChar(_) => {
                reply_code::INVALID_ARGUMENT
            }
        };
        MonitorError::NonFatalError(code)
    }
}

impl<C> Display for MonitorError<C>
where
    C: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::MonitorError::*;
        match self {
            ConnectionRead(e) => write!(f, "Connection Error while reading request: {:?}", e),
            ConnectionWrite(e) => write!(f, "Connection Error while writing response: {:?}", e),
            NonFatalError(_) => write!(f, "Internal non-fatal error. End users should never see this!"),
        }
    }
}

#[cfg(feature = "std")]
impl<C> std::error::Error for MonitorError<C> where C: Debug {}
