//! Error types for Huffman stream coding.

use thiserror::Error;

/// Error variants for encode and decode calls.
///
/// The set is closed: every failure a call can report is one of these, and
/// none of them is retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error from the source, the sink, or the replay store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream does not start with the format's magic token.
    #[error("header corrupt: bad magic {found:02x?}")]
    HeaderCorrupt {
        /// The four bytes found where the magic token was expected.
        found: [u8; 4],
    },

    /// The stream ended inside the header.
    #[error("truncated header")]
    TruncatedHeader,

    /// The header parsed but describes an impossible frequency table.
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),

    /// The tree walk asked for a child that does not exist.
    #[error("bitstream corrupt: walked past a leaf")]
    BitstreamCorrupt,

    /// The payload ran out before every declared symbol was decoded.
    #[error("length mismatch: expected {expected} symbols, decoded {decoded}")]
    LengthMismatch {
        /// Symbol count declared by the header.
        expected: u64,
        /// Symbols decoded before the payload was exhausted.
        decoded: u64,
    },

    /// An encoder or decoder option is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// A specialized Result type for Huffman stream operations.
pub type Result<T> = std::result::Result<T, Error>;
