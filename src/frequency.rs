//! Byte frequency analysis.
//!
//! The analyzer makes the first of the encoder's two passes: it reads the
//! source exactly once, counts every byte into a dense 256-slot table, and
//! copies each chunk unmodified into a replay store so the second pass can
//! read the same bytes again without holding them in memory.

use std::io::{ErrorKind, Read, Write};

use crate::error::Result;

/// Default read size for both encoder passes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Occurrence counts for every byte value.
///
/// Backed by a dense array; only nonzero entries are observable through
/// [`iter`](Self::iter) and [`len`](Self::len), and iteration is always in
/// ascending symbol order.
#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl FrequencyTable {
    /// An empty table.
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    /// Wrap a dense count array.
    pub fn from_counts(counts: [u64; 256]) -> Self {
        Self { counts }
    }

    /// Count every byte of `bytes`.
    pub fn record(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.counts[b as usize] += 1;
        }
    }

    /// Set the count for one symbol, replacing any previous value.
    pub fn insert(&mut self, symbol: u8, freq: u64) {
        self.counts[symbol as usize] = freq;
    }

    /// Count for `symbol` (zero if absent).
    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    /// Nonzero `(symbol, count)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &f)| f > 0)
            .map(|(s, &f)| (s as u8, f))
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.iter().filter(|&&f| f > 0).count()
    }

    /// True when no symbol has been seen.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&f| f == 0)
    }

    /// Sum of all counts, or `None` if it does not fit in a `u64`.
    pub fn checked_total(&self) -> Option<u64> {
        self.counts.iter().try_fold(0u64, |acc, &f| acc.checked_add(f))
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    ///
    /// Tables produced by [`analyze`] never saturate; their total is the
    /// number of bytes read.
    pub fn total(&self) -> u64 {
        self.checked_total().unwrap_or(u64::MAX)
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl FromIterator<(u8, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (symbol, freq) in iter {
            table.insert(symbol, freq);
        }
        table
    }
}

/// Read `source` to end-of-stream in `chunk_size` pieces, counting bytes and
/// mirroring every chunk into `store`.
///
/// `Interrupted` reads are reissued; any other error aborts the scan and is
/// returned as-is.
pub fn analyze<R, W>(mut source: R, store: &mut W, chunk_size: usize) -> Result<FrequencyTable>
where
    R: Read,
    W: Write + ?Sized,
{
    let mut table = FrequencyTable::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let chunk = &buf[..n];
        table.record(chunk);
        store.write_all(chunk)?;
    }
    store.flush()?;
    Ok(table)
}
