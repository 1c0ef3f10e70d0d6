//! Compression codec infrastructure for ZIP entries.
//!
//! ZIP identifies the compression of each entry by a 16-bit method id. This
//! crate reads and writes the two methods found in practically every
//! archive: Stored (0) and Deflated (8). Other ids are kept in entry
//! metadata but their data cannot be decoded.

#[cfg(feature = "deflate")]
pub mod deflate;

mod stored;

use std::fmt;
use std::io::Read;

use crate::{Error, Result};

/// Decoder for uncompressed entries.
pub use stored::StoredDecoder;

#[cfg(feature = "deflate")]
pub use deflate::{DeflateDecoder, DeflateEncoder};

/// A decoder that reads compressed data and produces uncompressed output.
pub trait Decoder: Read {
    /// Returns the method this decoder handles.
    fn method(&self) -> CompressionMethod;
}

/// ZIP method ids.
pub mod method {
    /// Stored (no compression).
    pub const STORED: u16 = 0;
    /// Deflate.
    pub const DEFLATED: u16 = 8;
    /// Deflate64 (read-only in most tools, unsupported here).
    pub const DEFLATE64: u16 = 9;
    /// BZip2.
    pub const BZIP2: u16 = 12;
    /// LZMA.
    pub const LZMA: u16 = 14;
    /// Zstandard.
    pub const ZSTD: u16 = 93;
    /// WinZip AES marker method.
    pub const AES: u16 = 99;
}

/// Compression method of a ZIP entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Data is stored without compression.
    Stored,
    /// Data is compressed with Deflate.
    Deflated,
    /// Any other method id.
    Other(u16),
}

impl CompressionMethod {
    /// Maps a raw method id.
    pub const fn from_id(id: u16) -> Self {
        match id {
            method::STORED => Self::Stored,
            method::DEFLATED => Self::Deflated,
            other => Self::Other(other),
        }
    }

    /// Returns the raw method id.
    pub const fn id(self) -> u16 {
        match self {
            Self::Stored => method::STORED,
            Self::Deflated => method::DEFLATED,
            Self::Other(id) => id,
        }
    }

    /// Returns true if this build can produce entries with this method.
    pub fn is_writable(self) -> bool {
        match self {
            Self::Stored => true,
            Self::Deflated => cfg!(feature = "deflate"),
            Self::Other(_) => false,
        }
    }

    /// Returns true if this build can decode entries with this method.
    pub fn is_readable(self) -> bool {
        self.is_writable()
    }

    /// Returns a human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stored => "Stored",
            Self::Deflated => "Deflated",
            Self::Other(method::DEFLATE64) => "Deflate64",
            Self::Other(method::BZIP2) => "BZip2",
            Self::Other(method::LZMA) => "LZMA",
            Self::Other(method::ZSTD) => "Zstd",
            Self::Other(method::AES) => "AES",
            Self::Other(_) => "Unknown",
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(id) => write!(f, "{} ({})", self.name(), id),
            _ => f.write_str(self.name()),
        }
    }
}

/// Builds a decoder for `compressed_size` bytes of entry data read from `input`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedMethod`] when the method cannot be decoded by
/// this build.
pub fn build_decoder<'a, R: Read + 'a>(
    method: CompressionMethod,
    input: R,
    compressed_size: u64,
) -> Result<Box<dyn Decoder + 'a>> {
    match method {
        CompressionMethod::Stored => Ok(Box::new(StoredDecoder::new(input, compressed_size))),
        #[cfg(feature = "deflate")]
        CompressionMethod::Deflated => Ok(Box::new(DeflateDecoder::new(std::io::BufReader::new(
            input.take(compressed_size),
        )))),
        other => Err(Error::UnsupportedMethod { method: other.id() }),
    }
}
