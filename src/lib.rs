//! # Streaming Huffman Coding
//!
//! *Static Huffman compression for streams of any length, in bounded memory.*
//!
//! ## Intuition First
//!
//! Morse code gives `E` a single dot and `Q` four symbols, because `E` is
//! common and `Q` is rare. Huffman coding does the same for bytes: count how
//! often each byte appears, then give frequent bytes short bit strings and
//! rare bytes long ones, arranged so that no code is the prefix of another.
//! A decoder reading bits one at a time always knows where each code ends.
//!
//! ## The Problem
//!
//! Static Huffman needs the whole input's statistics before the first code
//! can be written, and the decoder needs those statistics before it can read
//! one. The straightforward approach loads the input into memory, which fails
//! for inputs larger than memory. This crate makes two passes instead:
//!
//! ```text
//! encode:  source ──► count + spill ──► tree ──► codes ──► header
//!                        │                                    │
//!                   replay store ──────► replay ──► pack ──► payload
//!
//! decode:  header ──► tree ──► walk payload bits ──► sink
//! ```
//!
//! The spilled copy lives in a temporary file, so resident memory is the
//! 256-entry tables plus one chunk buffer, whatever the input length.
//!
//! ## Determinism
//!
//! Encoder and decoder build the tree independently from the header's
//! frequency table, so both must make identical choices when frequencies
//! tie. Every node carries a creation sequence number (leaves in ascending
//! byte order, then internal nodes in merge order) and ties go to the
//! earlier node. The header lists entries in ascending byte order, so equal
//! inputs always give byte-identical streams.
//!
//! ## Wire Format
//!
//! ```text
//! "HUF1" | padding:u8 | count:u16le | count × (symbol:u8, freq:u64le) | payload
//! ```
//!
//! The payload is absent when the input is empty or consists of one repeated
//! byte value; the frequency table alone reproduces those.
//!
//! ## Usage
//!
//! ```
//! let mut packed = Vec::new();
//! huffstream::encode(&b"abracadabra"[..], &mut packed)?;
//!
//! let mut unpacked = Vec::new();
//! huffstream::decode(&packed[..], &mut unpacked)?;
//! assert_eq!(unpacked, b"abracadabra");
//! # Ok::<(), huffstream::Error>(())
//! ```
//!
//! ## References
//!
//! - Huffman, D. A. (1952). "A Method for the Construction of Minimum-Redundancy Codes."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bits;
pub mod decode;
pub mod encode;
pub mod error;
pub mod frequency;
pub mod header;
pub mod huffman;
pub mod replay;

pub use decode::{decode, DecodeStats, Decoder, DecoderConfig};
pub use encode::{encode, EncodeStats, Encoder, EncoderConfig};
pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use header::{Header, MAGIC};
pub use huffman::{Code, CodeTable, HuffmanTree, Node};
pub use replay::{open_store, ReplayBacking, ReplayStore};
