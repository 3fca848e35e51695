//! A bounded, cursor-addressed byte buffer.
//!
//! [`Buffer`] is the monitor's single scratch area: the packet codec writes a
//! received payload into it, command handlers parse the request out of it and
//! then overwrite it with their reply, and the codec frames whatever is left.
//!
//! Writes never fail. Instead, the first write past the end of the storage
//! latches an _overrun_ flag which stays set until the buffer is
//! [`reset`](Buffer::reset); a buffer that has overrun must not be trusted.

use core::fmt;

use managed::ManagedSlice;
use num_traits::{CheckedAdd, CheckedMul, FromPrimitive, PrimInt, Zero};

use crate::protocol::hex::{ascii2byte, byte2hex, decode_hex};

/// Errors raised while reading from a [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer's contents.
    Overrun,
    /// Expected a hex digit, found something else.
    InvalidHex,
    /// Expected a specific separator, found something else.
    UnexpectedChar(u8),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::Overrun => write!(f, "read past the end of the buffer"),
            BufferError::InvalidHex => write!(f, "malformed hex data"),
            BufferError::UnexpectedChar(c) => write!(f, "unexpected character {:?}", *c as char),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BufferError {}

/// A fixed-capacity byte buffer with independent read and write cursors.
pub struct Buffer<'a> {
    storage: ManagedSlice<'a, u8>,
    read_idx: usize,
    write_idx: usize,
    overrun: bool,
}

impl<'a> Buffer<'a> {
    /// Wrap `storage`. The buffer starts out empty.
    pub fn new(storage: ManagedSlice<'a, u8>) -> Buffer<'a> {
        Buffer {
            storage,
            read_idx: 0,
            write_idx: 0,
            overrun: false,
        }
    }

    /// Reset both cursors and the overrun flag.
    pub fn reset(&mut self) {
        self.read_idx = 0;
        self.write_idx = 0;
        self.overrun = false;
    }

    /// Total number of bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.write_idx
    }

    /// Returns `true` if nothing has been written since the last reset.
    pub fn is_empty(&self) -> bool {
        self.write_idx == 0
    }

    /// Whether a write ever exceeded the buffer's capacity since the last
    /// reset.
    pub fn overrun_detected(&self) -> bool {
        self.overrun
    }

    /// Everything written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.write_idx]
    }

    /// The written bytes which haven't been consumed by a read yet.
    pub fn remaining(&self) -> &[u8] {
        &self.storage[self.read_idx..self.write_idx]
    }

    /// Number of written bytes which haven't been consumed by a read yet.
    pub fn bytes_left(&self) -> usize {
        self.write_idx - self.read_idx
    }

    /// Append a single raw byte.
    pub fn write_byte(&mut self, byte: u8) {
        if self.overrun || self.write_idx >= self.storage.len() {
            self.overrun = true;
            return;
        }
        self.storage[self.write_idx] = byte;
        self.write_idx += 1;
    }

    /// Append a character, UTF-8 encoded.
    pub fn write_char(&mut self, c: char) {
        let mut utf8 = [0; 4];
        self.write_str(c.encode_utf8(&mut utf8));
    }

    /// Append an entire string.
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Append a slice of raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) {
        for &b in data {
            self.write_byte(b);
        }
    }

    /// Append a byte as two lowercase ascii hex digits.
    pub fn write_byte_as_hex(&mut self, byte: u8) {
        let [hi, lo] = byte2hex(byte);
        self.write_byte(hi);
        self.write_byte(lo);
    }

    /// Append a byte-buffer as a hex string (i.e: two ascii chars / byte).
    pub fn write_hex_buf(&mut self, data: &[u8]) {
        for &b in data {
            self.write_byte_as_hex(b);
        }
    }

    /// Append data using the binary protocol's escaping rules.
    pub fn write_binary(&mut self, data: &[u8]) {
        for &b in data {
            match b {
                b'#' | b'$' | b'}' | b'*' => {
                    self.write_byte(b'}');
                    self.write_byte(b ^ 0x20);
                }
                _ => self.write_byte(b),
            }
        }
    }

    /// Append a number as a big-endian hex string using the most compact
    /// representation possible (i.e: trimming leading zeros).
    pub fn write_num<D: PrimInt>(&mut self, num: D) {
        let nibble_mask = !(!D::zero() << 4);
        let nibbles = core::mem::size_of::<D>() * 2;

        let mut started = false;
        for i in (0..nibbles).rev() {
            let nibble = (num.unsigned_shr((i * 4) as u32) & nibble_mask)
                .to_u8()
                .unwrap_or(0);
            if nibble == 0 && !started && i != 0 {
                continue;
            }
            started = true;
            self.write_byte(byte2hex(nibble)[1]);
        }
    }

    /// Append a signed number as a hex string, with a leading `-` if negative.
    pub fn write_int(&mut self, num: i32) {
        if num < 0 {
            self.write_byte(b'-');
        }
        self.write_num(num.unsigned_abs());
    }

    /// Consume a single byte.
    pub fn read_char(&mut self) -> Result<u8, BufferError> {
        let c = *self.remaining().first().ok_or(BufferError::Overrun)?;
        self.read_idx += 1;
        Ok(c)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_char(&self) -> Option<u8> {
        self.remaining().first().copied()
    }

    /// Consume the next byte if it equals `c`, returning whether it did.
    pub fn is_next_char(&mut self, c: u8) -> bool {
        if self.peek_char() == Some(c) {
            self.read_idx += 1;
            true
        } else {
            false
        }
    }

    /// Consume the separator `c`, or fail.
    pub fn expect_char(&mut self, c: u8) -> Result<(), BufferError> {
        match self.read_char()? {
            x if x == c => Ok(()),
            x => Err(BufferError::UnexpectedChar(x)),
        }
    }

    /// Consume `s` if the unread data starts with it, returning whether it did.
    pub fn matches_str(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s.as_bytes()) {
            self.read_idx += s.len();
            true
        } else {
            false
        }
    }

    /// Consume two hex digits and decode them into a byte.
    pub fn read_byte_as_hex(&mut self) -> Result<u8, BufferError> {
        let hi = ascii2byte(self.read_char()?).ok_or(BufferError::InvalidHex)?;
        let lo = ascii2byte(self.read_char()?).ok_or(BufferError::InvalidHex)?;
        Ok(hi << 4 | lo)
    }

    /// Consume a run of hex digits and decode them into an integer. At least
    /// one digit must be present.
    pub fn read_hex<I>(&mut self) -> Result<I, BufferError>
    where
        I: FromPrimitive + Zero + CheckedAdd + CheckedMul,
    {
        let digits = self
            .remaining()
            .iter()
            .take_while(|&&c| ascii2byte(c).is_some())
            .count();
        if digits == 0 {
            return Err(match self.peek_char() {
                Some(_) => BufferError::InvalidHex,
                None => BufferError::Overrun,
            });
        }

        let start = self.read_idx;
        let val = decode_hex(&self.storage[start..start + digits])
            .map_err(|_| BufferError::InvalidHex)?;
        self.read_idx += digits;
        Ok(val)
    }

    /// Consume an optionally negative hex integer (e.g: `-1`, `1f`).
    pub fn read_int(&mut self) -> Result<i32, BufferError> {
        let negative = self.is_next_char(b'-');
        let magnitude: u32 = self.read_hex()?;
        let val = magnitude as i32;
        Ok(if negative { val.wrapping_neg() } else { val })
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("contents", &core::str::from_utf8(self.as_slice()))
            .field("read_idx", &self.read_idx)
            .field("capacity", &self.capacity())
            .field("overrun", &self.overrun)
            .finish()
    }
}
