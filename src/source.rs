//! Sources of added entries.
//!
//! An [`EntrySource`] describes one entry to add to an archive: its
//! metadata and a way to open its content. Every call to
//! [`open`](EntrySource::open) yields a fresh, independent stream.
//!
//! # Example
//!
//! ```rust
//! use std::io::Read;
//! use zipmerge::ArchivePath;
//! use zipmerge::source::{BytesSource, EntrySource};
//!
//! let source = BytesSource::new(ArchivePath::new("notes.txt")?, b"hello".to_vec());
//! assert_eq!(source.record()?.size, Some(5));
//!
//! let mut text = String::new();
//! source.open()?.read_to_string(&mut text)?;
//! assert_eq!(text, "hello");
//! # Ok::<(), zipmerge::Error>(())
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::checksum::{Checksum, Crc32};
use crate::codec::CompressionMethod;
use crate::record::EntryRecord;
use crate::timestamp::Timestamp;
use crate::{ArchivePath, Result};

/// One entry to add to an archive.
pub trait EntrySource: Send + Sync {
    /// Returns the metadata of the entry.
    fn record(&self) -> Result<EntryRecord>;

    /// Opens a new stream over the entry content.
    fn open(&self) -> Result<Box<dyn Read + '_>>;
}

impl<S: EntrySource + ?Sized> EntrySource for Box<S> {
    fn record(&self) -> Result<EntryRecord> {
        (**self).record()
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        (**self).open()
    }
}

/// A file (or directory) on disk.
///
/// A directory yields a directory entry with no content.
#[derive(Debug, Clone)]
pub struct FileSource {
    name: ArchivePath,
    path: PathBuf,
}

impl FileSource {
    /// Creates a source for `path`, stored under `name`.
    pub fn new(name: ArchivePath, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }

    /// Returns the path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the entry name.
    pub fn name(&self) -> &ArchivePath {
        &self.name
    }
}

impl EntrySource for FileSource {
    fn record(&self) -> Result<EntryRecord> {
        let metadata = fs::metadata(&self.path)?;
        let mod_time =
            Timestamp::from_filetime(filetime::FileTime::from_last_modification_time(&metadata));
        let record = if metadata.is_dir() {
            EntryRecord::new(self.name.to_directory().into_string())
        } else {
            EntryRecord::new(self.name.as_str()).with_size(metadata.len())
        };
        Ok(record.with_mod_time(mod_time))
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        if self.path.is_dir() {
            return Ok(Box::new(io::empty()));
        }
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory content. Clones share the buffer.
#[derive(Debug, Clone)]
pub struct BytesSource {
    name: ArchivePath,
    data: Arc<[u8]>,
    mod_time: Option<Timestamp>,
    method: Option<CompressionMethod>,
}

impl BytesSource {
    /// Creates a source holding `data` under `name`.
    pub fn new(name: ArchivePath, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name,
            data: data.into(),
            mod_time: None,
            method: None,
        }
    }

    /// Sets the modification time; the writer uses the current time
    /// otherwise.
    pub fn with_mod_time(mut self, mod_time: Timestamp) -> Self {
        self.mod_time = Some(mod_time);
        self
    }

    /// Requests a compression method for this entry.
    pub fn with_method(mut self, method: CompressionMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Returns the content.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl EntrySource for BytesSource {
    fn record(&self) -> Result<EntryRecord> {
        let mut record = EntryRecord::new(self.name.as_str())
            .with_size(self.data.len() as u64)
            .with_crc32(Crc32::compute(&self.data));
        record.mod_time = self.mod_time;
        record.method = self.method;
        Ok(record)
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(&self.data[..]))
    }
}

type Opener = dyn Fn() -> io::Result<Box<dyn Read>> + Send + Sync;

/// Content produced by a caller-supplied opener.
///
/// The opener is called once per [`open`](EntrySource::open) and must
/// return a fresh reader each time.
///
/// ```rust
/// use std::io::Cursor;
/// use zipmerge::ArchivePath;
/// use zipmerge::source::{EntrySource, ReaderSource};
///
/// let source = ReaderSource::new(ArchivePath::new("gen.txt")?, || {
///     Ok(Cursor::new(b"generated".to_vec()))
/// })
/// .with_size_hint(9);
/// assert_eq!(source.record()?.size, Some(9));
/// # Ok::<(), zipmerge::Error>(())
/// ```
pub struct ReaderSource {
    name: ArchivePath,
    opener: Box<Opener>,
    size_hint: Option<u64>,
    mod_time: Option<Timestamp>,
}

impl ReaderSource {
    /// Creates a source whose content comes from `opener`.
    pub fn new<F, R>(name: ArchivePath, opener: F) -> Self
    where
        F: Fn() -> io::Result<R> + Send + Sync + 'static,
        R: Read + 'static,
    {
        Self {
            name,
            opener: Box::new(move || opener().map(|r| Box::new(r) as Box<dyn Read>)),
            size_hint: None,
            mod_time: None,
        }
    }

    /// Declares the content length. A stream of another length fails with
    /// [`Error::SizeMismatch`](crate::Error::SizeMismatch) when written.
    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }

    /// Sets the modification time.
    pub fn with_mod_time(mut self, mod_time: Timestamp) -> Self {
        self.mod_time = Some(mod_time);
        self
    }
}

impl fmt::Debug for ReaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderSource")
            .field("name", &self.name)
            .field("size_hint", &self.size_hint)
            .finish_non_exhaustive()
    }
}

impl EntrySource for ReaderSource {
    fn record(&self) -> Result<EntryRecord> {
        let mut record = EntryRecord::new(self.name.as_str());
        record.size = self.size_hint;
        record.mod_time = self.mod_time;
        Ok(record)
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        Ok((self.opener)()?)
    }
}
