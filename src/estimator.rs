/*!
 * Compressed size estimation
 */

use std::io::{self, Read, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::EstimateError;

const READ_CHUNK: usize = 64 * 1024;

/// Writer that discards everything and remembers how much it was given
#[derive(Debug, Default)]
pub struct CountingSink {
    written: u64,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Number of bytes `reader` occupies once gzip-compressed at the default level.
///
/// The compressed stream goes straight into a [`CountingSink`], so memory use
/// is bounded by the read chunk regardless of input size.
pub fn estimate_compressed_size<R: Read>(mut reader: R) -> Result<u64, EstimateError> {
    let mut encoder = GzEncoder::new(CountingSink::new(), Compression::default());
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(EstimateError::Read(e)),
        };
        encoder
            .write_all(&buf[..n])
            .map_err(EstimateError::Compression)?;
    }

    let sink = encoder.finish().map_err(EstimateError::Compression)?;
    Ok(sink.written())
}
