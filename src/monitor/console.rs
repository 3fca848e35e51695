use core::fmt;

use crate::buffer::Buffer;
use crate::conn::ConnectionExt;
use crate::monitor::error::MonitorError as Error;
use crate::protocol::packet::PacketCodec;

/// Sends text to the GDB console as `O<hex>` packets.
///
/// Output is not buffered: every `write_str` is sent right away, split into
/// as many packets as needed to fit the packet buffer.
pub(crate) struct ConsoleOutput<'a, 'b, C: ConnectionExt> {
    conn: &'a mut C,
    codec: &'a mut PacketCodec,
    buf: &'a mut Buffer<'b>,
    error: Option<Error<C::Error>>,
}

impl<'a, 'b, C: ConnectionExt> ConsoleOutput<'a, 'b, C> {
    pub fn new(
        conn: &'a mut C,
        codec: &'a mut PacketCodec,
        buf: &'a mut Buffer<'b>,
    ) -> ConsoleOutput<'a, 'b, C> {
        ConsoleOutput {
            conn,
            codec,
            buf,
            error: None,
        }
    }

    /// Write raw (non UTF-8) data to the GDB console.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), Error<C::Error>> {
        // 'O', then two hex digits per byte
        let chunk_len = (self.buf.capacity().saturating_sub(1) / 2).max(1);

        for chunk in bytes.chunks(chunk_len) {
            self.buf.reset();
            self.buf.write_char('O');
            self.buf.write_hex_buf(chunk);
            self.codec.send(self.conn, self.buf.as_slice())?;
        }
        Ok(())
    }

    /// Returns the first connection error hit while writing, if any.
    pub fn finish(self) -> Result<(), Error<C::Error>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<C: ConnectionExt> fmt::Write for ConsoleOutput<'_, '_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.error.is_some() {
            return Err(fmt::Error);
        }

        match self.write_raw(s.as_bytes()) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.error = Some(e);
                Err(fmt::Error)
            }
        }
    }
}
