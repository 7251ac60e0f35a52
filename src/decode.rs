//! The streaming decoder.
//!
//! The header's frequency table is authoritative: it fixes the tree shape and
//! the number of symbols to produce. Decoding stops the moment that count is
//! reached, so padding bits and anything after them are never interpreted.
//! The source is a [`BufRead`] and only bytes that were actually decoded are
//! consumed from it, which leaves a following stream (or any trailer) in place
//! for the caller.

use std::io::{BufRead, ErrorKind, Write};

use log::debug;

use crate::error::{Error, Result};
use crate::frequency::DEFAULT_CHUNK_SIZE;
use crate::header::Header;
use crate::huffman::{HuffmanTree, Node};

/// Decoder options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Output flush size.
    pub buffer_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl DecoderConfig {
    /// Set the buffer size.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfig("buffer_size must be nonzero"));
        }
        Ok(())
    }
}

/// What a decode call consumed and produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Header bytes read.
    pub header_bytes: u64,
    /// Payload bytes interpreted.
    pub payload_bytes: u64,
    /// Bytes written to the sink.
    pub output_bytes: u64,
}

/// Streaming Huffman decoder.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` for a zero buffer size.
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Decode one framed stream from `source` into `sink`.
    ///
    /// # Errors
    /// Header errors (`HeaderCorrupt`, `TruncatedHeader`, `MalformedHeader`)
    /// are raised before any tree is built. `LengthMismatch` means the
    /// payload ended early; any sink or source failure is `Io`.
    ///
    /// On success `source` is left positioned just after the byte holding
    /// the final symbol. Wrap plain readers in a `BufReader`.
    pub fn decode<R: BufRead, W: Write>(&self, mut source: R, mut sink: W) -> Result<DecodeStats> {
        let header = Header::read_from(&mut source)?;
        let mut stats = DecodeStats {
            header_bytes: header.encoded_len() as u64,
            ..DecodeStats::default()
        };

        let Some(tree) = HuffmanTree::build(&header.table)? else {
            debug!("decoded empty stream");
            return Ok(stats);
        };
        let expected = header.table.total();

        if let Some(symbol) = tree.single_symbol() {
            self.write_run(&mut sink, symbol, expected)?;
            stats.output_bytes = expected;
            debug!("decoded run of {expected} x {symbol:#04x}");
            return Ok(stats);
        }

        let root = tree.root();
        let mut cursor = root;
        let mut decoded = 0u64;
        let mut output = Vec::with_capacity(self.config.buffer_size);

        while decoded < expected {
            let chunk = match source.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if chunk.is_empty() {
                break;
            }
            let mut used = 0;
            'chunk: for &byte in chunk {
                used += 1;
                for shift in (0..8).rev() {
                    cursor = cursor.child((byte >> shift) & 1 == 1)?;
                    if let Node::Leaf { symbol, .. } = cursor {
                        output.push(*symbol);
                        decoded += 1;
                        cursor = root;
                        if decoded == expected {
                            break 'chunk;
                        }
                        if output.len() >= self.config.buffer_size {
                            sink.write_all(&output)?;
                            output.clear();
                        }
                    }
                }
            }
            source.consume(used);
            stats.payload_bytes += used as u64;
        }

        if decoded < expected {
            return Err(Error::LengthMismatch { expected, decoded });
        }
        sink.write_all(&output)?;
        sink.flush()?;
        stats.output_bytes = decoded;

        debug!(
            "decoded {} header + {} payload bytes into {} bytes",
            stats.header_bytes, stats.payload_bytes, stats.output_bytes
        );
        Ok(stats)
    }

    /// Write `symbol` `count` times without consuming any payload.
    fn write_run<W: Write>(&self, sink: &mut W, symbol: u8, count: u64) -> Result<()> {
        let block_len = count.min(self.config.buffer_size as u64) as usize;
        let block = vec![symbol; block_len];
        let mut left = count;
        while left > 0 {
            let n = left.min(block_len as u64) as usize;
            sink.write_all(&block[..n])?;
            left -= n as u64;
        }
        sink.flush()?;
        Ok(())
    }
}

/// Decode `source` into `sink` with default options.
pub fn decode<R: BufRead, W: Write>(source: R, sink: W) -> Result<DecodeStats> {
    Decoder::default().decode(source, sink)
}
