//! The two-pass streaming encoder.
//!
//! Pass one counts symbols while spilling the input into a replay store.
//! Once the table is complete the tree, the codes and the padding are all
//! known, so the header is written exactly once and the output never needs
//! to be seeked. Pass two replays the store through the code table into a
//! packed bitstream.

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use log::debug;

use crate::bits::BitWriter;
use crate::error::{Error, Result};
use crate::frequency::{analyze, FrequencyTable, DEFAULT_CHUNK_SIZE};
use crate::header::Header;
use crate::huffman::{padding_bits, CodeTable, HuffmanTree};
use crate::replay::{open_store, ReplayBacking, ReplayStore};

/// Encoder options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Read size for both passes, and the output flush size.
    pub chunk_size: usize,
    /// Where the input is held between passes.
    pub replay: ReplayBacking,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            replay: ReplayBacking::default(),
        }
    }
}

impl EncoderConfig {
    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the replay backing.
    pub fn with_replay(mut self, replay: ReplayBacking) -> Self {
        self.replay = replay;
        self
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be nonzero"));
        }
        Ok(())
    }
}

/// What an encode call produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Bytes read from the source.
    pub input_bytes: u64,
    /// Distinct byte values in the input.
    pub distinct_symbols: usize,
    /// Header bytes written.
    pub header_bytes: u64,
    /// Payload bytes written.
    pub payload_bytes: u64,
    /// Filler bits in the last payload byte.
    pub padding_bits: u8,
}

impl EncodeStats {
    /// Total bytes written to the sink.
    pub fn output_bytes(&self) -> u64 {
        self.header_bytes + self.payload_bytes
    }

    /// Output size over input size; `0.0` for empty input.
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        self.output_bytes() as f64 / self.input_bytes as f64
    }
}

/// Streaming Huffman encoder.
///
/// Holds only configuration; every call builds its own store, tree and
/// codes, so one encoder may be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    config: EncoderConfig,
}

impl Encoder {
    /// Create an encoder.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` for a zero chunk size.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Encode all of `source` into `sink`.
    ///
    /// The replay store is opened per call and released when the call
    /// returns, on success and on every error.
    pub fn encode<R: Read, W: Write>(&self, source: R, sink: W) -> Result<EncodeStats> {
        let mut store = open_store(&self.config.replay)?;
        self.encode_with_store(source, sink, &mut store)
    }

    /// Encode using a caller-supplied replay store.
    ///
    /// `store` must be empty. It is left holding a copy of the input;
    /// releasing it is the caller's job.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` before reading `source` if `store`
    /// already holds data.
    pub fn encode_with_store<R, W, S>(
        &self,
        source: R,
        mut sink: W,
        store: &mut S,
    ) -> Result<EncodeStats>
    where
        R: Read,
        W: Write,
        S: ReplayStore + ?Sized,
    {
        if store.seek(SeekFrom::End(0))? != 0 {
            return Err(Error::InvalidConfig("replay store must be empty"));
        }
        let chunk_size = self.config.chunk_size;
        let table = analyze(source, &mut *store, chunk_size)?;
        let mut stats = EncodeStats {
            input_bytes: table.total(),
            distinct_symbols: table.len(),
            ..EncodeStats::default()
        };

        let tree = match HuffmanTree::build(&table)? {
            Some(tree) if tree.single_symbol().is_none() => tree,
            _ => {
                // Empty input, or a single run of one byte value: the header
                // alone describes the stream.
                stats.header_bytes = write_header(&mut sink, 0, table)?;
                sink.flush()?;
                debug!(
                    "encoded {} bytes ({} symbols) as header only",
                    stats.input_bytes, stats.distinct_symbols
                );
                return Ok(stats);
            }
        };

        let codes = CodeTable::new(Some(&tree));
        let total_bits = codes.total_bits(&table);
        stats.padding_bits = padding_bits(total_bits);
        stats.header_bytes = write_header(&mut sink, stats.padding_bits, table)?;

        store.rewind_for_replay()?;
        let mut writer = BitWriter::with_capacity(sink, chunk_size);
        let mut buf = vec![0u8; chunk_size];
        loop {
            let n = match store.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            for &b in &buf[..n] {
                writer.write_code(codes.get(b))?;
            }
        }
        let (_, payload_bytes) = writer.finish()?;
        debug_assert_eq!(payload_bytes as u128, total_bits.div_ceil(8));
        stats.payload_bytes = payload_bytes;

        debug!(
            "encoded {} bytes ({} symbols) into {} header + {} payload bytes, {} padding bits",
            stats.input_bytes,
            stats.distinct_symbols,
            stats.header_bytes,
            stats.payload_bytes,
            stats.padding_bits
        );
        Ok(stats)
    }
}

fn write_header<W: Write>(sink: &mut W, padding: u8, table: FrequencyTable) -> Result<u64> {
    let header = Header { padding, table };
    Ok(header.write_to(sink)? as u64)
}

/// Encode `source` into `sink` with default options.
pub fn encode<R: Read, W: Write>(source: R, sink: W) -> Result<EncodeStats> {
    Encoder::default().encode(source, sink)
}
