use log::*;

use crate::buffer::Buffer;
use crate::conn::ConnectionExt;
use crate::monitor::MonitorError as Error;
use crate::protocol::hex::byte2hex;
use crate::protocol::recv_packet::{RecvEvent, RecvPacketStateMachine, INTERRUPT_BYTE};

/// Compute the RSP checksum of a packet payload: the modulo-256 sum of its
/// bytes.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |a, x| a.wrapping_add(*x))
}

/// Frames, acknowledges and (re)transmits RSP packets.
///
/// Checksum failures never make it out of the codec: a corrupt incoming frame
/// is NACK'd and the codec waits for the retransmission, and an outgoing frame
/// is resent until the host ACKs it.
pub struct PacketCodec {
    recv: RecvPacketStateMachine,
    interrupted: bool,
}

impl PacketCodec {
    pub fn new() -> PacketCodec {
        PacketCodec {
            recv: RecvPacketStateMachine::new(),
            interrupted: false,
        }
    }

    /// Returns whether an out-of-band interrupt byte was seen since the last
    /// call, clearing the latch.
    pub fn take_interrupt(&mut self) -> bool {
        core::mem::replace(&mut self.interrupted, false)
    }

    /// Block until a frame with a valid checksum has been received, leaving
    /// its payload in `buf`.
    pub fn recv<C: ConnectionExt>(
        &mut self,
        conn: &mut C,
        buf: &mut Buffer<'_>,
    ) -> Result<(), Error<C::Error>> {
        buf.reset();

        loop {
            let byte = conn.read().map_err(Error::ConnectionRead)?;
            let (checksum, calculated) = match self.recv.pump(buf, byte) {
                RecvEvent::Pending => continue,
                RecvEvent::Interrupt => {
                    debug!("<-- interrupt");
                    self.interrupted = true;
                    continue;
                }
                RecvEvent::MalformedChecksum => {
                    warn!("received a packet with a malformed checksum");
                    self.nack(conn)?;
                    continue;
                }
                RecvEvent::Frame {
                    checksum,
                    calculated,
                } => (checksum, calculated),
            };

            if checksum != calculated {
                warn!(
                    "checksum mismatch (got {:02x}, calculated {:02x}), requesting retransmit",
                    checksum, calculated
                );
                self.nack(conn)?;
                continue;
            }

            #[cfg(feature = "trace-pkt")]
            trace!(
                "<-- ${}#{:02x}",
                core::str::from_utf8(buf.as_slice()).unwrap_or("<invalid packet>"),
                checksum
            );

            conn.write(b'+').map_err(Error::ConnectionWrite)?;
            conn.flush().map_err(Error::ConnectionWrite)?;
            return Ok(());
        }
    }

    /// Send `payload` as a framed packet, blocking until the host ACKs it.
    pub fn send<C: ConnectionExt>(
        &mut self,
        conn: &mut C,
        payload: &[u8],
    ) -> Result<(), Error<C::Error>> {
        let [hi, lo] = byte2hex(checksum(payload));

        loop {
            conn.write(b'$').map_err(Error::ConnectionWrite)?;
            conn.write_all(payload).map_err(Error::ConnectionWrite)?;
            conn.write_all(&[b'#', hi, lo])
                .map_err(Error::ConnectionWrite)?;
            conn.flush().map_err(Error::ConnectionWrite)?;

            #[cfg(feature = "trace-pkt")]
            trace!(
                "--> ${}#{}{}",
                core::str::from_utf8(payload).unwrap_or("<binary packet>"),
                hi as char,
                lo as char
            );

            if self.wait_for_ack(conn)? {
                return Ok(());
            }
            warn!("host nack'd the last packet, retransmitting");
        }
    }

    /// Returns `true` on ACK, `false` on NACK.
    fn wait_for_ack<C: ConnectionExt>(&mut self, conn: &mut C) -> Result<bool, Error<C::Error>> {
        loop {
            match conn.read().map_err(Error::ConnectionRead)? {
                b'+' => return Ok(true),
                b'-' => return Ok(false),
                INTERRUPT_BYTE => {
                    debug!("<-- interrupt");
                    self.interrupted = true;
                }
                // The host has already moved on to its next packet, so our
                // ACK must have been lost on the way.
                b'$' => {
                    debug!("host started a new packet before ack'ing, treating as ack");
                    self.recv.start_in_body();
                    return Ok(true);
                }
                other => trace!("ignoring {:#04x} while waiting for ack", other),
            }
        }
    }

    fn nack<C: ConnectionExt>(&mut self, conn: &mut C) -> Result<(), Error<C::Error>> {
        conn.write(b'-').map_err(Error::ConnectionWrite)?;
        conn.flush().map_err(Error::ConnectionWrite)
    }
}
