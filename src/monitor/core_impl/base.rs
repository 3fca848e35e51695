use super::prelude::*;

use crate::buffer::BufferError;
use crate::common::Signal;
use crate::platform::TrapReason;
use crate::protocol::hex::is_hex;

/// Memory is moved between the platform and the packet buffer in chunks of
/// this many bytes.
const MEMORY_CHUNK: usize = 32;

impl<P: Platform, C: ConnectionExt> MonitorImpl<P, C> {
    /// Write a `T` stop reply for the current signal into `buf`.
    pub(crate) fn write_stop_reply(&self, buf: &mut Buffer<'_>, platform: &P) {
        let Signal(signal) = self.state.signal;

        buf.reset();
        buf.write_char('T');
        buf.write_byte_as_hex(signal);

        if self.state.signal == Signal::SIGTRAP {
            if let TrapReason::Watchpoint { kind, addr } = platform.trap_reason() {
                buf.write_str(kind.stop_reason_name());
                buf.write_byte(b':');
                buf.write_num(addr);
                buf.write_byte(b';');
            }
        }

        platform.write_stop_registers(&mut |regnum, val| {
            buf.write_byte_as_hex(regnum);
            buf.write_byte(b':');
            buf.write_hex_buf(&val.to_le_bytes());
            buf.write_byte(b';');
        });
    }

    pub(crate) fn handle_stop_reason(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        self.write_stop_reply(buf, platform);
        Ok(HandlerStatus::REPLY)
    }

    pub(crate) fn handle_read_registers(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        buf.reset();
        buf.write_hex_buf(platform.context());
        Ok(HandlerStatus::REPLY)
    }

    pub(crate) fn handle_write_registers(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let old_pc = platform.program_counter();
        let context = platform.context_mut();

        // validate everything up front, so a short or corrupt packet can't
        // leave the context half-written
        let hex_len = context.len() * 2;
        let valid = buf.bytes_left() >= hex_len && buf.remaining()[..hex_len].iter().all(|c| is_hex(*c));
        if !valid {
            return Err(ErrorReply(reply_code::INVALID_ARGUMENT).into());
        }

        for byte in context.iter_mut() {
            *byte = buf.read_byte_as_hex()?;
        }

        if platform.program_counter() != old_pc {
            self.state.set_pc_modified(true);
        }

        buf.reset();
        buf.write_str("OK");
        Ok(HandlerStatus::REPLY)
    }

    pub(crate) fn handle_read_memory(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let addr: u32 = buf.read_hex()?;
        buf.expect_char(b',')?;
        let len: u32 = buf.read_hex()?;

        let len = len as usize;
        if len.saturating_mul(2) > buf.capacity() {
            return Err(ErrorReply(reply_code::BUFFER_OVERRUN).into());
        }

        buf.reset();
        let mut chunk = [0; MEMORY_CHUNK];
        let mut offset = 0;
        while offset < len {
            let n = MEMORY_CHUNK.min(len - offset);
            platform
                .read_memory(addr.wrapping_add(offset as u32), &mut chunk[..n])
                .or_reply(reply_code::MEMORY_ACCESS_FAILURE)?;
            buf.write_hex_buf(&chunk[..n]);
            offset += n;
        }

        Ok(HandlerStatus::REPLY)
    }

    pub(crate) fn handle_write_memory(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let (addr, len) = parse_addr_len(buf)?;

        let hex_len = len.saturating_mul(2);
        let valid = buf.bytes_left() >= hex_len && buf.remaining()[..hex_len].iter().all(|c| is_hex(*c));
        if !valid {
            return Err(ErrorReply(reply_code::INVALID_ARGUMENT).into());
        }

        let mut chunk = [0; MEMORY_CHUNK];
        let mut offset = 0;
        while offset < len {
            let n = MEMORY_CHUNK.min(len - offset);
            for b in chunk[..n].iter_mut() {
                *b = buf.read_byte_as_hex()?;
            }
            platform
                .write_memory(addr.wrapping_add(offset as u32), &chunk[..n])
                .or_reply(reply_code::MEMORY_ACCESS_FAILURE)?;
            offset += n;
        }

        buf.reset();
        buf.write_str("OK");
        Ok(HandlerStatus::REPLY)
    }

    pub(crate) fn handle_write_binary_memory(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let (addr, len) = parse_addr_len(buf)?;

        if BinaryData(buf.remaining()).count() < len {
            return Err(ErrorReply(reply_code::INVALID_ARGUMENT).into());
        }

        let mut data = BinaryData(buf.remaining());
        let mut chunk = [0; MEMORY_CHUNK];
        let mut offset = 0;
        while offset < len {
            let n = MEMORY_CHUNK.min(len - offset);
            for (dst, src) in chunk[..n].iter_mut().zip(&mut data) {
                *dst = src;
            }
            platform
                .write_memory(addr.wrapping_add(offset as u32), &chunk[..n])
                .or_reply(reply_code::MEMORY_ACCESS_FAILURE)?;
            offset += n;
        }

        buf.reset();
        buf.write_str("OK");
        Ok(HandlerStatus::REPLY)
    }
}

/// Parse the `<addr>,<len>:` prefix shared by `M` and `X`.
fn parse_addr_len(buf: &mut Buffer<'_>) -> Result<(u32, usize), BufferError> {
    let addr: u32 = buf.read_hex()?;
    buf.expect_char(b',')?;
    let len: u32 = buf.read_hex()?;
    buf.expect_char(b':')?;
    Ok((addr, len as usize))
}

/// Iterator over the payload of an `X` packet, undoing the `}` escapes.
struct BinaryData<'a>(&'a [u8]);

impl Iterator for BinaryData<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let (&b, rest) = self.0.split_first()?;
        self.0 = rest;
        if b != b'}' {
            return Some(b);
        }

        let (&escaped, rest) = self.0.split_first()?;
        self.0 = rest;
        Some(escaped ^ 0x20)
    }
}
