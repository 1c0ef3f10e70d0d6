//! Stored entries (method 0).

use std::io::{self, Read, Take};

use super::{CompressionMethod, Decoder};

/// Reads exactly the recorded number of bytes of a Stored entry.
///
/// Input ending before that is reported as `UnexpectedEof` rather than a
/// short entry.
pub struct StoredDecoder<R> {
    inner: Take<R>,
}

impl<R: Read> StoredDecoder<R> {
    /// Creates a decoder for `size` bytes of `inner`.
    pub fn new(inner: R, size: u64) -> Self {
        Self {
            inner: inner.take(size),
        }
    }
}

impl<R> std::fmt::Debug for StoredDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredDecoder")
            .field("remaining", &self.inner.limit())
            .finish()
    }
}

impl<R: Read> Read for StoredDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.inner.limit() == 0 {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stored data truncated, {} bytes missing", self.inner.limit()),
            ));
        }
        Ok(n)
    }
}

impl<R: Read> Decoder for StoredDecoder<R> {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Stored
    }
}
