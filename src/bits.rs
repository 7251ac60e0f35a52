//! MSB-first bit packing onto a byte sink.

use std::io::{self, Write};

use crate::huffman::Code;

/// Widest slice pushed into the accumulator at once. With at most 7 bits
/// pending, 56 more still fit in the 64-bit accumulator.
const MAX_PUSH: u32 = 56;

/// Packs codes into bytes, most significant bit first, and writes full
/// bytes to the sink through an internal buffer.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    buf: Vec<u8>,
    limit: usize,
    acc: u64,
    nbits: u32,
    written: u64,
}

impl<W: Write> BitWriter<W> {
    /// Create a writer that flushes to `inner` every `capacity` bytes.
    pub fn with_capacity(inner: W, capacity: usize) -> Self {
        let limit = capacity.max(1);
        Self {
            inner,
            buf: Vec::with_capacity(limit + 8),
            limit,
            acc: 0,
            nbits: 0,
            written: 0,
        }
    }

    /// Append the low `len` bits of `value`. `len` must be at most 56.
    #[inline]
    fn push_bits(&mut self, value: u64, len: u32) -> io::Result<()> {
        debug_assert!(len <= MAX_PUSH && self.nbits < 8);
        self.acc = (self.acc << len) | value;
        self.nbits += len;
        while self.nbits >= 8 {
            self.nbits -= 8;
            self.buf.push((self.acc >> self.nbits) as u8);
        }
        self.acc &= (1u64 << self.nbits) - 1;
        if self.buf.len() >= self.limit {
            self.drain()?;
        }
        Ok(())
    }

    /// Append one code.
    #[inline]
    pub fn write_code(&mut self, code: Code) -> io::Result<()> {
        if code.len <= MAX_PUSH {
            return self.push_bits(code.value as u64, code.len);
        }
        let mut remaining = code.len;
        while remaining > 0 {
            let take = remaining.min(MAX_PUSH);
            remaining -= take;
            let slice = (code.value >> remaining) as u64 & ((1u64 << take) - 1);
            self.push_bits(slice, take)?;
        }
        Ok(())
    }

    fn drain(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            self.inner.write_all(&self.buf)?;
            self.written += self.buf.len() as u64;
            self.buf.clear();
        }
        Ok(())
    }

    /// Left-justify any pending bits into a final byte, flush everything,
    /// and return the sink with the number of bytes written.
    pub fn finish(mut self) -> io::Result<(W, u64)> {
        if self.nbits > 0 {
            self.buf.push((self.acc << (8 - self.nbits)) as u8);
            self.nbits = 0;
            self.acc = 0;
        }
        self.drain()?;
        self.inner.flush()?;
        Ok((self.inner, self.written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(value: u128, len: u32) -> Code {
        Code { value, len }
    }

    #[test]
    fn test_msb_first_with_zero_padding() {
        let mut w = BitWriter::with_capacity(Vec::new(), 4);
        w.write_code(code(0b1, 1)).unwrap();
        w.write_code(code(0b011, 3)).unwrap();
        w.write_code(code(0b11110, 5)).unwrap();
        let (out, n) = w.finish().unwrap();
        // 1 011 1111 | 0 + 7 padding bits
        assert_eq!(out, vec![0b1011_1111, 0b0000_0000]);
        assert_eq!(n, 2);
    }

    #[test]
    fn test_byte_aligned_has_no_tail() {
        let mut w = BitWriter::with_capacity(Vec::new(), 1);
        for _ in 0..4 {
            w.write_code(code(0b10, 2)).unwrap();
        }
        let (out, n) = w.finish().unwrap();
        assert_eq!(out, vec![0b1010_1010]);
        assert_eq!(n, 1);
    }

    #[test]
    fn test_wide_codes_split_across_pushes() {
        let value: u128 = (1u128 << 90) | 0x2_5555_5555_5555_5555_5555;
        let mut w = BitWriter::with_capacity(Vec::new(), 64);
        w.write_code(code(1, 3)).unwrap(); // 001
        w.write_code(code(value, 91)).unwrap();
        let (out, n) = w.finish().unwrap();
        assert_eq!(n, 12);

        // Reassemble the 94 bits and compare.
        let mut bits = 0u128;
        for &b in &out {
            bits = (bits << 8) | b as u128;
        }
        let bits = bits >> 2; // 96 - 94 padding bits
        assert_eq!(bits >> 91, 1);
        assert_eq!(bits & ((1u128 << 91) - 1), value);
    }
}
