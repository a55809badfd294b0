//! MSB-first bit I/O.
//!
//! Codes are written most significant bit first, so a code `0b10` of length
//! 2 lands as the bits `1, 0` in stream order. The final partial byte is zero
//! padded; the exact number of meaningful bits travels out-of-band.

use crate::error::{Error, Result};

/// Width of the lookahead window used by [`BitReader::peek_padded`].
const PEEK_BYTES: usize = 5;

/// Bit writer for encoding.
#[derive(Debug, Default)]
pub struct BitWriter {
    output: Vec<u8>,
    bit_buf: u64,
    bit_count: u32,
    total_bits: u64,
}

impl BitWriter {
    /// Create a new bit writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with capacity hint in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Write the low `n` bits of `value`, most significant first.
    #[inline]
    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32);
        if n == 0 {
            return;
        }
        let mask = (1u64 << n) - 1;
        self.bit_buf = (self.bit_buf << n) | (value as u64 & mask);
        self.bit_count += n as u32;
        self.total_bits += n as u64;

        // Flush complete bytes
        while self.bit_count >= 8 {
            self.bit_count -= 8;
            self.output.push((self.bit_buf >> self.bit_count) as u8);
        }
        self.bit_buf &= (1u64 << self.bit_count) - 1;
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Write an unsigned integer as 7-bit groups, low group first.
    ///
    /// Each group is one byte on the bit stream: the high bit is set when
    /// another group follows.
    pub fn write_varint(&mut self, mut value: u64) {
        loop {
            let group = (value & 0x7F) as u32;
            value >>= 7;
            if value == 0 {
                self.write_bits(group, 8);
                return;
            }
            self.write_bits(group | 0x80, 8);
        }
    }

    /// Write raw bytes, eight bits each.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_bits(byte as u32, 8);
        }
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> u64 {
        self.total_bits
    }

    /// Zero-pad the last byte and return the bytes with the exact bit count.
    pub fn finish(mut self) -> (Vec<u8>, u64) {
        if self.bit_count > 0 {
            let pad = 8 - self.bit_count;
            self.output.push((self.bit_buf << pad) as u8);
        }
        (self.output, self.total_bits)
    }
}

/// Bit reader bounded by a recorded bit length.
///
/// The reader is a plain cursor over borrowed bytes; each decode call owns
/// its own reader.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_len: u64,
    pos: u64,
}

impl<'a> BitReader<'a> {
    /// Create a reader over `data` that stops at `bit_len` bits.
    ///
    /// Fails if `bit_len` claims more bits than `data` holds.
    pub fn new(data: &'a [u8], bit_len: u64) -> Result<Self> {
        let available = data.len() as u64 * 8;
        if bit_len > available {
            return Err(Error::malformed(
                format!("recorded length {bit_len} exceeds {available} available bits"),
                0,
            ));
        }
        Ok(Self {
            data,
            bit_len,
            pos: 0,
        })
    }

    /// Current bit position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bits left before the recorded end.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.bit_len - self.pos
    }

    /// Check if the cursor sits on the recorded end.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bit_len
    }

    /// Peek at the next `n` bits; bits past the recorded end read as zero.
    #[inline]
    pub fn peek_padded(&self, n: u8) -> u32 {
        debug_assert!(n <= 32);
        if n == 0 {
            return 0;
        }
        let byte_idx = (self.pos / 8) as usize;
        let shift = (self.pos % 8) as u32;

        let mut window = 0u64;
        for i in 0..PEEK_BYTES {
            let byte = self.data.get(byte_idx + i).copied().unwrap_or(0);
            window = (window << 8) | byte as u64;
        }
        let window_bits = (PEEK_BYTES * 8) as u32;
        let mut value = (window >> (window_bits - shift - n as u32)) & ((1u64 << n) - 1);

        // Mask out anything beyond the recorded length
        let end = self.pos + n as u64;
        if end > self.bit_len {
            let overhang = (end - self.bit_len).min(n as u64) as u32;
            value &= !((1u64 << overhang) - 1);
        }
        value as u32
    }

    /// Advance the cursor by `n` bits.
    #[inline]
    pub fn advance(&mut self, n: u8) -> Result<()> {
        if self.pos + n as u64 > self.bit_len {
            return Err(Error::malformed(
                format!("{n}-bit read runs past end of stream"),
                self.pos,
            ));
        }
        self.pos += n as u64;
        Ok(())
    }

    /// Read `n` bits.
    #[inline]
    pub fn read_bits(&mut self, n: u8) -> Result<u32> {
        let value = self.peek_padded(n);
        self.advance(n)?;
        Ok(value)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Read an unsigned integer written by [`BitWriter::write_varint`].
    pub fn read_varint(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let group = self.read_bits(8)? as u64;
            if shift >= 64 || (shift == 63 && (group & 0x7F) > 1) {
                return Err(Error::malformed("varint overflows 64 bits", start));
            }
            value |= (group & 0x7F) << shift;
            if group & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if (len as u64).saturating_mul(8) > self.remaining() {
            return Err(Error::malformed(
                format!("{len}-byte literal runs past end of stream"),
                self.pos,
            ));
        }
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(self.read_bits(8)? as u8);
        }
        Ok(bytes)
    }
}
