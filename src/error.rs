//! Error types for ZIP archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when reading, writing or merging ZIP archives, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. You can
//! handle errors using pattern matching or the `?` operator:
//!
//! ## Using the `?` Operator
//!
//! ```rust,no_run
//! use zipmerge::{MergeBuilder, Result};
//!
//! fn drop_entry(path: &str, entry: &str) -> Result<()> {
//!     let config = MergeBuilder::from_archive(path).remove(entry).build()?;
//!     config.process()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Exhaustive Error Matching
//!
//! ```rust,no_run
//! use zipmerge::{Archive, Error};
//!
//! fn open_or_report(path: &str) -> zipmerge::Result<()> {
//!     match Archive::open_path(path) {
//!         Ok(archive) => {
//!             println!("{} entries", archive.len());
//!             Ok(())
//!         }
//!         Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
//!             eprintln!("Archive not found: {}", path);
//!             Err(Error::Io(e))
//!         }
//!         Err(Error::InvalidFormat(msg)) => {
//!             eprintln!("Not a ZIP file: {}", msg);
//!             Err(Error::InvalidFormat(msg))
//!         }
//!         Err(Error::CorruptHeader { offset, reason }) => {
//!             eprintln!("Archive corrupted at byte {:#x}: {}", offset, reason);
//!             Err(Error::CorruptHeader { offset, reason })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! # fn main() {}
//! ```

use std::io;
use std::path::PathBuf;

/// The main error type for ZIP archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations, in-place commit |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader] | Invalid archive data |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod], [`UnsupportedFeature`][Self::UnsupportedFeature] | Missing codecs, encryption |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch], [`SizeMismatch`][Self::SizeMismatch] | Data corruption |
/// | Configuration | [`InvalidConfiguration`][Self::InvalidConfiguration], [`NotUnderRoot`][Self::NotUnderRoot] | Caller mistakes, raised before any I/O |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    ///
    /// Failures while opening or reading the source archive, writing the
    /// destination, or moving the staged archive into place all surface here.
    ///
    /// ```rust
    /// use zipmerge::Error;
    /// use std::io::ErrorKind;
    ///
    /// fn handle_io_error(error: &Error) {
    ///     if let Error::Io(e) = error {
    ///         match e.kind() {
    ///             ErrorKind::NotFound => println!("File not found"),
    ///             ErrorKind::PermissionDenied => println!("Access denied"),
    ///             _ => println!("I/O error: {}", e),
    ///         }
    ///     }
    /// }
    /// ```
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// The archive format is invalid or not recognized.
    ///
    /// Returned when no end of central directory record can be found, which
    /// usually means the input is not a ZIP archive at all.
    #[error("Invalid ZIP format: {0}")]
    InvalidFormat(String),

    /// A header record is corrupted or inconsistent.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// Byte offset of the offending record.
        offset: u64,
        /// Description of the problem.
        reason: String,
    },

    /// The entry uses a compression method this build cannot decode or encode.
    ///
    /// Deflate support requires the `deflate` feature.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// Numeric ZIP method id.
        method: u16,
    },

    /// The archive uses a feature that is not supported.
    ///
    /// Examples are encrypted entries and multi-disk (split) archives.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// Name of the unsupported feature.
        feature: &'static str,
    },

    /// CRC-32 of the streamed data does not match the recorded value.
    #[error("CRC mismatch for entry '{name}': expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// Entry name.
        name: String,
        /// CRC recorded in the archive or entry record.
        expected: u32,
        /// CRC computed from the data.
        actual: u32,
    },

    /// Number of bytes streamed does not match the recorded size.
    #[error("Size mismatch for entry '{name}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Entry name.
        name: String,
        /// Size recorded in the archive or entry record.
        expected: u64,
        /// Bytes actually seen.
        actual: u64,
    },

    /// An invalid archive path was provided.
    ///
    /// See [`ArchivePath`](crate::ArchivePath) for the validation rules.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// An entry name cannot be represented in the configured name encoding.
    #[error("Entry name '{name}' cannot be encoded as {encoding}")]
    NameEncoding {
        /// The offending name (lossily decoded when reading).
        name: String,
        /// Label of the encoding in use.
        encoding: &'static str,
    },

    /// The merge configuration cannot be executed.
    ///
    /// Raised immediately, before any I/O, e.g. when neither a source archive
    /// nor a destination was configured.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A file handed to the directory helpers is not beneath its root.
    #[error("'{}' is not beneath '{}'", .path.display(), .root.display())]
    NotUnderRoot {
        /// The file that was listed.
        path: PathBuf,
        /// The declared root directory.
        root: PathBuf,
    },

    /// An entry was not found in the archive.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// An invalid compression level was provided.
    ///
    /// ```rust
    /// use zipmerge::{Error, write::WriteOptions};
    ///
    /// assert!(WriteOptions::new().level(6).is_ok());
    /// let result = WriteOptions::new().level(15);
    /// assert!(matches!(result, Err(Error::InvalidCompressionLevel { level: 15 })));
    /// ```
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The invalid level that was provided.
        level: u32,
    },

    /// The writer was used out of order (e.g. data written with no open entry).
    #[error("Writer misuse: {0}")]
    WriterState(&'static str),
}

impl Error {
    /// Returns `true` if this error was raised before any I/O took place.
    ///
    /// Configuration errors never leave files behind.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfiguration(_)
                | Error::NotUnderRoot { .. }
                | Error::InvalidArchivePath(_)
                | Error::InvalidCompressionLevel { .. }
        )
    }

    /// Returns `true` if this error indicates damaged archive data.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_)
                | Error::CorruptHeader { .. }
                | Error::CrcMismatch { .. }
                | Error::SizeMismatch { .. }
        )
    }
}

impl From<io::Error> for Error {
    /// Wraps an I/O error, unwrapping crate errors that travelled through
    /// an `io::Read`/`io::Write` boundary (e.g. CRC checks in entry readers).
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(ours)) => *ours,
            Some(Err(other)) => Error::Io(io::Error::new(kind, other)),
            None => Error::Io(io::Error::from(kind)),
        }
    }
}

/// A specialized Result type for ZIP archive operations.
pub type Result<T> = std::result::Result<T, Error>;
