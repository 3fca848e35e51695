use super::prelude::*;

use log::*;

impl<P: Platform, C: ConnectionExt> MonitorImpl<P, C> {
    /// The `q` family of general query packets.
    pub(crate) fn handle_query(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        if buf.matches_str("Supported") {
            self.handle_q_supported(buf, platform)
        } else if buf.matches_str("Xfer:memory-map:read:") {
            let annex_ok = buf.is_next_char(b':');
            self.handle_qxfer(buf, platform.memory_map_xml(), annex_ok)
        } else if buf.matches_str("Xfer:features:read:") {
            let annex_ok = buf.matches_str("target.xml:");
            self.handle_qxfer(buf, platform.target_xml(), annex_ok)
        } else {
            trace!("unsupported query: {:?}", core::str::from_utf8(buf.remaining()));
            buf.reset();
            Ok(HandlerStatus::REPLY)
        }
    }

    fn handle_q_supported(
        &mut self,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let capacity = buf.capacity();

        buf.reset();
        if platform.memory_map_xml().is_some() {
            buf.write_str("qXfer:memory-map:read+;");
        }
        if platform.target_xml().is_some() {
            buf.write_str("qXfer:features:read+;");
        }
        buf.write_str("PacketSize=");
        buf.write_num(capacity);
        Ok(HandlerStatus::REPLY)
    }

    /// Serve a chunk of a static descriptor. `annex_ok` is whether the
    /// request named an annex this monitor knows about.
    fn handle_qxfer(
        &mut self,
        buf: &mut Buffer<'_>,
        data: Option<&'static str>,
        annex_ok: bool,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let data = match data {
            Some(data) => data.as_bytes(),
            None => {
                buf.reset();
                return Ok(HandlerStatus::REPLY);
            }
        };

        if !annex_ok {
            return Err(ErrorReply(reply_code::INVALID_ARGUMENT).into());
        }

        let offset: usize = buf.read_hex()?;
        buf.expect_char(b',')?;
        let len: usize = buf.read_hex()?;

        // leave room for the 'm'/'l' prefix, and for every byte needing to be
        // escaped
        let len = len.min(buf.capacity().saturating_sub(1) / 2);

        buf.reset();
        if offset >= data.len() {
            buf.write_byte(b'l');
            return Ok(HandlerStatus::REPLY);
        }

        let end = offset.saturating_add(len).min(data.len());
        buf.write_byte(if end < data.len() { b'm' } else { b'l' });
        buf.write_binary(&data[offset..end]);
        Ok(HandlerStatus::REPLY)
    }
}
