//! Checksum computation utilities.
//!
//! ZIP records a CRC-32 (IEEE 802.3 polynomial) of every entry's
//! uncompressed data. This module provides the hasher plus reader wrappers
//! used to compute and verify it while streaming.
//!
//! # Example
//!
//! ```rust
//! use zipmerge::checksum::{Crc32, Checksum};
//!
//! let mut crc32 = Crc32::new();
//! crc32.update(b"Hello, ");
//! crc32.update(b"World!");
//! assert_eq!(crc32.finalize(), Crc32::compute(b"Hello, World!"));
//! ```

use std::io::{self, Read};

use crate::Error;

/// Common trait for checksum computation.
pub trait Checksum: Default + Clone {
    /// The output type of this checksum.
    type Output: Copy + Eq + std::fmt::Debug;

    /// Creates a new checksum calculator.
    fn new() -> Self;

    /// Updates the checksum with additional data.
    fn update(&mut self, data: &[u8]);

    /// Finishes the checksum computation and returns the value.
    fn finalize(&self) -> Self::Output;

    /// Computes the checksum of a single slice in one call.
    fn compute(data: &[u8]) -> Self::Output {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// CRC-32 checksum calculator.
///
/// ```rust
/// use zipmerge::checksum::{Crc32, Checksum};
///
/// assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
/// ```
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Checksum for Crc32 {
    type Output = u32;

    fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

/// A reader wrapper that computes CRC-32 while reading.
///
/// ```rust
/// use zipmerge::checksum::Crc32Reader;
/// use std::io::{Cursor, Read};
///
/// let mut reader = Crc32Reader::new(Cursor::new(b"Hello, World!"));
/// let mut buffer = Vec::new();
/// reader.read_to_end(&mut buffer).unwrap();
/// assert_eq!(reader.crc(), 0xEC4AC3D0);
/// ```
pub struct Crc32Reader<R> {
    inner: R,
    crc: Crc32,
    bytes_read: u64,
}

impl<R> Crc32Reader<R> {
    /// Creates a new CRC-32 reader wrapping the given reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            bytes_read: 0,
        }
    }

    /// Returns the current CRC-32 value.
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Returns the number of bytes read.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Consumes the wrapper and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Crc32Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// A reader that checks size and CRC-32 against recorded values at EOF.
///
/// A mismatch is reported as an `io::Error` of kind `InvalidData` carrying
/// [`Error::CrcMismatch`] or [`Error::SizeMismatch`]; converting it back with
/// `?` yields the original variant.
pub struct VerifyingReader<R> {
    inner: Crc32Reader<R>,
    name: String,
    expected_crc: Option<u32>,
    expected_size: Option<u64>,
    verified: bool,
}

impl<R: Read> VerifyingReader<R> {
    /// Wraps `inner`, expecting the given CRC and size for entry `name`.
    pub fn new(
        inner: R,
        name: impl Into<String>,
        expected_crc: Option<u32>,
        expected_size: Option<u64>,
    ) -> Self {
        Self {
            inner: Crc32Reader::new(inner),
            name: name.into(),
            expected_crc,
            expected_size,
            verified: false,
        }
    }

    fn verify(&mut self) -> io::Result<()> {
        if self.verified {
            return Ok(());
        }
        self.verified = true;

        if let Some(expected) = self.expected_size {
            let actual = self.inner.bytes_read();
            if actual != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    Error::SizeMismatch {
                        name: self.name.clone(),
                        expected,
                        actual,
                    },
                ));
            }
        }
        if let Some(expected) = self.expected_crc {
            let actual = self.inner.crc();
            if actual != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    Error::CrcMismatch {
                        name: self.name.clone(),
                        expected,
                        actual,
                    },
                ));
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for VerifyingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.verify()?;
        }
        Ok(n)
    }
}
