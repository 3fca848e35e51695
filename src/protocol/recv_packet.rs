use log::*;

use crate::buffer::Buffer;
use crate::protocol::hex::decode_hex;

/// Out-of-band byte GDB sends to interrupt the target (Ctrl-C).
pub const INTERRUPT_BYTE: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    Body,
    Checksum1,
    Checksum2(u8),
}

/// Result of feeding a single byte into a [`RecvPacketStateMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvEvent {
    /// More bytes are needed to complete the frame.
    Pending,
    /// The host sent an out-of-band interrupt request.
    Interrupt,
    /// A full `$<payload>#<checksum>` frame was received. The payload is in
    /// the buffer.
    Frame { checksum: u8, calculated: u8 },
    /// A full frame was received, but its checksum field wasn't valid hex.
    MalformedChecksum,
}

/// Receives a packet incrementally, one byte at a time.
///
/// Payload bytes are written straight into the monitor's [`Buffer`]. If the
/// payload is longer than the buffer, the rest of the frame is still consumed
/// (so the stream stays in sync), and the buffer's overrun flag is left set.
pub struct RecvPacketStateMachine {
    state: State,
    checksum: u8,
}

impl RecvPacketStateMachine {
    pub fn new() -> Self {
        RecvPacketStateMachine {
            state: State::Ready,
            checksum: 0,
        }
    }

    /// Resume as though a `$` had just been received.
    ///
    /// Used when the `$` of the host's next packet was consumed while waiting
    /// for the acknowledgement of one of our own packets.
    pub fn start_in_body(&mut self) {
        self.state = State::Body;
        self.checksum = 0;
    }

    pub fn pump(&mut self, buf: &mut Buffer<'_>, byte: u8) -> RecvEvent {
        match self.state {
            State::Ready => match byte {
                b'$' => {
                    buf.reset();
                    self.start_in_body();
                }
                INTERRUPT_BYTE => return RecvEvent::Interrupt,
                // stray acks, line noise, etc...
                _ => {}
            },
            State::Body => match byte {
                b'$' => {
                    warn!("'$' inside packet body, restarting frame");
                    buf.reset();
                    self.start_in_body();
                }
                b'#' => self.state = State::Checksum1,
                _ => {
                    self.checksum = self.checksum.wrapping_add(byte);
                    buf.write_byte(byte);
                }
            },
            State::Checksum1 => match byte {
                b'$' => {
                    buf.reset();
                    self.start_in_body();
                }
                _ => self.state = State::Checksum2(byte),
            },
            State::Checksum2(c1) => {
                if byte == b'$' {
                    buf.reset();
                    self.start_in_body();
                    return RecvEvent::Pending;
                }

                self.state = State::Ready;
                return match decode_hex::<u8>(&[c1, byte]) {
                    Ok(checksum) => RecvEvent::Frame {
                        checksum,
                        calculated: self.checksum,
                    },
                    Err(_) => RecvEvent::MalformedChecksum,
                };
            }
        }

        RecvEvent::Pending
    }
}
