//! Stream header codec.
//!
//! ```text
//! offset  size      field
//! 0       4         magic "HUF1"
//! 4       1         padding bits in the final payload byte (0-7)
//! 5       2         entry count, u16 LE (0-256)
//! 7       9 * n     entries: symbol u8, frequency u64 LE, ascending symbol
//! ```
//!
//! Entries are always written in ascending symbol order, so identical inputs
//! always produce identical headers.

use std::io::{self, ErrorKind, Read, Write};

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;

/// Format identifier at the start of every stream.
pub const MAGIC: [u8; 4] = *b"HUF1";

/// Size of the fixed part of the header.
pub const FIXED_LEN: usize = 7;

/// Size of one serialized table entry.
pub const ENTRY_LEN: usize = 9;

/// Decoded stream header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Filler bits at the end of the payload.
    pub padding: u8,
    /// Symbol frequencies of the original input.
    pub table: FrequencyTable,
}

impl Header {
    /// Bytes this header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        FIXED_LEN + ENTRY_LEN * self.table.len()
    }

    /// Serialize into `w` with a single `write_all`.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize> {
        debug_assert!(self.padding < 8);
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&MAGIC);
        buf.push(self.padding);
        buf.extend_from_slice(&(self.table.len() as u16).to_le_bytes());
        for (symbol, freq) in self.table.iter() {
            buf.push(symbol);
            buf.extend_from_slice(&freq.to_le_bytes());
        }
        w.write_all(&buf)?;
        Ok(buf.len())
    }

    /// Parse a header from `r`, consuming exactly its bytes.
    ///
    /// # Errors
    /// - `HeaderCorrupt` if the magic token does not match; nothing past it
    ///   is read.
    /// - `TruncatedHeader` if the stream ends inside the header.
    /// - `MalformedHeader` if the table is impossible: padding above 7, more
    ///   than 256 entries, symbols out of order or repeated, a zero
    ///   frequency, or a total that overflows `u64`.
    pub fn read_from<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        read_field(r, &mut magic)?;
        if magic != MAGIC {
            return Err(Error::HeaderCorrupt { found: magic });
        }

        let mut fixed = [0u8; 3];
        read_field(r, &mut fixed)?;
        let padding = fixed[0];
        let count = u16::from_le_bytes([fixed[1], fixed[2]]) as usize;
        if padding > 7 {
            return Err(Error::MalformedHeader("padding exceeds 7 bits"));
        }
        if count > 256 {
            return Err(Error::MalformedHeader("more than 256 entries"));
        }

        let mut entries = vec![0u8; count * ENTRY_LEN];
        read_field(r, &mut entries)?;

        let mut table = FrequencyTable::new();
        let mut prev: Option<u8> = None;
        let mut total = 0u64;
        for entry in entries.chunks_exact(ENTRY_LEN) {
            let symbol = entry[0];
            let mut freq_bytes = [0u8; 8];
            freq_bytes.copy_from_slice(&entry[1..]);
            let freq = u64::from_le_bytes(freq_bytes);

            if prev.is_some_and(|p| p >= symbol) {
                return Err(Error::MalformedHeader("entries not in ascending order"));
            }
            if freq == 0 {
                return Err(Error::MalformedHeader("zero frequency entry"));
            }
            total = total
                .checked_add(freq)
                .ok_or(Error::MalformedHeader("frequency total overflows u64"))?;
            table.insert(symbol, freq);
            prev = Some(symbol);
        }

        Ok(Self { padding, table })
    }
}

/// `read_exact`, with end-of-stream reported as a truncated header.
fn read_field<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e: io::Error| match e.kind() {
        ErrorKind::UnexpectedEof => Error::TruncatedHeader,
        _ => Error::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            padding: 3,
            table: [(b'z', 2), (b'a', 300), (0xff, 1 << 40)].into_iter().collect(),
        }
    }

    #[test]
    fn test_layout() {
        let mut out = Vec::new();
        let n = sample().write_to(&mut out).unwrap();
        assert_eq!(n, FIXED_LEN + 3 * ENTRY_LEN);
        assert_eq!(n, sample().encoded_len());

        let mut expected = b"HUF1".to_vec();
        expected.push(3);
        expected.extend_from_slice(&[3, 0]);
        expected.push(b'a');
        expected.extend_from_slice(&300u64.to_le_bytes());
        expected.push(b'z');
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.push(0xff);
        expected.extend_from_slice(&(1u64 << 40).to_le_bytes());
        assert_eq!(out, expected);
    }

    #[test]
    fn test_parse_consumes_exactly_the_header() {
        let mut bytes = Vec::new();
        sample().write_to(&mut bytes).unwrap();
        bytes.extend_from_slice(b"payload");

        let mut r = &bytes[..];
        let parsed = Header::read_from(&mut r).unwrap();
        assert_eq!(parsed, sample());
        assert_eq!(r, b"payload");
    }

    #[test]
    fn test_empty_header() {
        let empty = Header {
            padding: 0,
            table: FrequencyTable::new(),
        };
        let mut bytes = Vec::new();
        empty.write_to(&mut bytes).unwrap();
        assert_eq!(bytes, b"HUF1\x00\x00\x00");
        assert_eq!(Header::read_from(&mut &bytes[..]).unwrap(), empty);
    }

    #[test]
    fn test_bad_magic() {
        let err = Header::read_from(&mut &b"HUF2\x00\x00\x00"[..]).unwrap_err();
        assert!(matches!(err, Error::HeaderCorrupt { found } if &found == b"HUF2"));
    }

    #[test]
    fn test_every_truncation_point() {
        let mut bytes = Vec::new();
        sample().write_to(&mut bytes).unwrap();
        for cut in 0..bytes.len() {
            let err = Header::read_from(&mut &bytes[..cut]).unwrap_err();
            assert!(matches!(err, Error::TruncatedHeader), "cut at {cut}: {err:?}");
        }
    }

    fn raw(padding: u8, entries: &[(u8, u64)]) -> Vec<u8> {
        let mut bytes = b"HUF1".to_vec();
        bytes.push(padding);
        bytes.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for &(s, f) in entries {
            bytes.push(s);
            bytes.extend_from_slice(&f.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_malformed_tables() {
        let cases = [
            raw(8, &[(1, 1)]),
            raw(0, &[(2, 1), (1, 1)]),
            raw(0, &[(1, 1), (1, 1)]),
            raw(0, &[(1, 0)]),
            raw(0, &[(1, u64::MAX), (2, 1)]),
        ];
        for bytes in cases {
            let err = Header::read_from(&mut &bytes[..]).unwrap_err();
            assert!(matches!(err, Error::MalformedHeader(_)), "{err:?}");
        }

        let mut too_many = b"HUF1\x00".to_vec();
        too_many.extend_from_slice(&257u16.to_le_bytes());
        let err = Header::read_from(&mut &too_many[..]).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }
}
