#![no_main]
use std::io::{self, Write};

use huffstream::decode;
use libfuzzer_sys::fuzz_target;

/// Forged headers can declare runs of up to 2^64 bytes; stop early.
struct Capped(usize);

impl Write for Capped {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "cap"));
        }
        self.0 -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let _ = decode(data, Capped(1 << 20));
});
