//! Traits to perform in-order, serial, byte-wise I/O with the host debugger.

/// A trait to perform in-order, serial, byte-wise I/O.
pub trait Connection {
    /// Transport-specific error type.
    ///
    /// A UART will typically use [`core::convert::Infallible`] here. Fallible
    /// transports (sockets, scripted test doubles, ...) abort the current
    /// debug session when they return an error.
    type Error;

    /// Write a single byte.
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Write the entire buffer, blocking until complete.
    ///
    /// This method's default implementation calls `self.write()` on each byte
    /// in the buffer. This can be quite inefficient, so if a more efficient
    /// implementation exists (such as a DMA transfer), this method should be
    /// overwritten.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        for b in buf {
            self.write(*b)?;
        }
        Ok(())
    }

    /// Flush this Connection, ensuring that all intermediately buffered
    /// contents reach their destination.
    ///
    /// _Note:_ Not all `Connection`s have internal buffering (e.g: writing data
    /// to a UART TX register with FIFOs disabled). In these cases, it's fine to
    /// simply return `Ok(())`.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Extends [`Connection`] with the receive side and the interrupt plumbing
/// the monitor needs.
pub trait ConnectionExt: Connection {
    /// Read a single byte, blocking until one is available.
    ///
    /// There is no timeout: once the target has trapped into the monitor it is
    /// committed to waiting for the host.
    fn read(&mut self) -> Result<u8, Self::Error>;

    /// Peek a single byte. This MUST be a **non-blocking** operation, returning
    /// `None` if no byte is available.
    ///
    /// Returns a byte (if one is available) without removing that byte from the
    /// queue. Subsequent calls to `peek` MUST return the same byte.
    fn peek(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Whether the transport's own receive interrupt is what caused the
    /// current trap into the monitor.
    ///
    /// Transports which don't route their interrupt to the monitor can rely on
    /// the default implementation, which always returns `false`.
    fn caused_interrupt(&mut self) -> bool {
        false
    }

    /// Acknowledge/clear the transport interrupt reported by
    /// [`caused_interrupt`](Self::caused_interrupt).
    fn clear_interrupt(&mut self) {}
}
