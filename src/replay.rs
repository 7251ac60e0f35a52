//! Replay stores for the encoder's second pass.
//!
//! The encoder must see its input twice: once to count symbols and once to
//! pack codes. Rather than holding the input in memory, the first pass spills
//! it into a replay store which is rewound and read back sequentially.
//!
//! Any `Read + Write + Seek` type is a store. Stores are owned by a single
//! encode call and dropped on every exit path; the temp-file backings are
//! deleted by the operating system when their handle closes.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use log::trace;
use tempfile::SpooledTempFile;

/// Sequential-write, rewind, sequential-read storage.
pub trait ReplayStore: Read + Write + Seek {
    /// Position the store at its first byte for replay.
    fn rewind_for_replay(&mut self) -> io::Result<()> {
        self.flush()?;
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }
}

impl<T: Read + Write + Seek> ReplayStore for T {}

/// Where an encoder spills its input between passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayBacking {
    /// An anonymous temporary file, in `dir` or the system temp directory.
    ///
    /// Memory use stays independent of input length.
    TempFile {
        /// Directory for the file; `None` uses the platform default.
        dir: Option<PathBuf>,
    },
    /// Memory up to `threshold` bytes, then an anonymous temporary file.
    Spooled {
        /// Bytes held in memory before spilling to disk.
        threshold: usize,
    },
    /// A growable in-memory buffer.
    ///
    /// Only suitable when the caller bounds the input size.
    Memory,
}

impl Default for ReplayBacking {
    fn default() -> Self {
        ReplayBacking::TempFile { dir: None }
    }
}

/// Open a fresh, empty store for one encode call.
pub fn open_store(backing: &ReplayBacking) -> io::Result<Box<dyn ReplayStore>> {
    let store: Box<dyn ReplayStore> = match backing {
        ReplayBacking::TempFile { dir: Some(dir) } => {
            trace!("replay store: temp file in {}", dir.display());
            Box::new(tempfile::tempfile_in(dir)?)
        }
        ReplayBacking::TempFile { dir: None } => {
            trace!("replay store: temp file in system temp dir");
            Box::new(tempfile::tempfile()?)
        }
        ReplayBacking::Spooled { threshold } => {
            trace!("replay store: spooled, threshold {threshold} bytes");
            Box::new(SpooledTempFile::new(*threshold))
        }
        ReplayBacking::Memory => {
            trace!("replay store: memory");
            Box::new(Cursor::new(Vec::new()))
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_and_replay(backing: ReplayBacking) -> Vec<u8> {
        let mut store = open_store(&backing).unwrap();
        store.write_all(b"first pass ").unwrap();
        store.write_all(b"second chunk").unwrap();
        store.rewind_for_replay().unwrap();
        let mut out = Vec::new();
        store.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_every_backing_replays_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for backing in [
            ReplayBacking::default(),
            ReplayBacking::TempFile {
                dir: Some(dir.path().to_path_buf()),
            },
            ReplayBacking::Spooled { threshold: 4 },
            ReplayBacking::Spooled { threshold: 1 << 20 },
            ReplayBacking::Memory,
        ] {
            assert_eq!(write_and_replay(backing), b"first pass second chunk");
        }
    }

    #[test]
    fn test_temp_file_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let backing = ReplayBacking::TempFile {
            dir: Some(dir.path().to_path_buf()),
        };
        {
            let mut store = open_store(&backing).unwrap();
            store.write_all(&[7u8; 4096]).unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let backing = ReplayBacking::TempFile {
            dir: Some(dir.path().join("does-not-exist")),
        };
        assert!(open_store(&backing).is_err());
    }
}
