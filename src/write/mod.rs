//! Streaming ZIP writer.
//!
//! The writer is strictly sequential and never seeks: each entry is a local
//! header, the (possibly compressed) data and, when the CRC and sizes were
//! not known up front, a data descriptor. The central directory is written
//! by [`Writer::finish`].
//!
//! # Example
//!
//! ```rust
//! use std::io::Write;
//! use zipmerge::write::{EntrySink, Writer};
//! use zipmerge::{ArchivePath, EntryRecord};
//!
//! let mut writer = Writer::create(Vec::new())?;
//! writer.add_bytes(ArchivePath::new("hello.txt")?, b"Hello, World!")?;
//!
//! // Entries can also be streamed.
//! writer.start_entry(&EntryRecord::new("log.txt"))?;
//! writer.write_all(b"line 1\n")?;
//! writer.write_all(b"line 2\n")?;
//! writer.finish_entry()?;
//!
//! let (result, bytes) = writer.finish_into_inner()?;
//! assert_eq!(result.entries_written, 2);
//! assert!(!bytes.is_empty());
//! # Ok::<(), zipmerge::Error>(())
//! ```

mod header_encode;
pub(crate) mod options;
mod writer_init;

pub use options::{WriteOptions, WriteResult};

use std::io::{self, Read, Write};
use std::mem;

use crate::checksum::{Checksum, Crc32};
use crate::codec::CompressionMethod;
#[cfg(feature = "deflate")]
use crate::codec::DeflateEncoder;
use crate::encoding::NameEncoding;
use crate::format::extra::{ZIP64_HEADER_ID, strip, zip64_block};
use crate::format::{
    DOS_DIRECTORY_ATTRIBUTE, MAX_COMMENT_LENGTH, ZIP64_MARKER_32, flags, version,
};
use crate::record::EntryRecord;
use crate::timestamp::Timestamp;
use crate::{ArchivePath, Error, Result};

use header_encode::{CentralRecord, LocalHeaderFields, write_data_descriptor, write_local_header};

/// The object-safe face of the writer handed to transformers.
///
/// An entry is opened with [`start_entry`](Self::start_entry), its content
/// written through [`Write`], and closed with
/// [`finish_entry`](Self::finish_entry). Several entries may be written in
/// sequence.
pub trait EntrySink: Write {
    /// Begins a new entry described by `record`.
    ///
    /// Unknown CRC, sizes and modification time are filled in by the writer.
    /// A known CRC or size is checked against the written data when the
    /// entry is finished.
    fn start_entry(&mut self, record: &EntryRecord) -> Result<()>;

    /// Completes the open entry.
    fn finish_entry(&mut self) -> Result<()>;
}

/// State of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Between entries.
    AcceptingEntries,
    /// An entry is open for data.
    EntryOpen,
    /// A write failed; the output is unusable.
    Failed,
    /// The central directory has been written.
    Finished,
}

/// Counts the bytes passed to the inner writer.
#[derive(Debug)]
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Where entry bytes currently go.
enum Output<W: Write> {
    Plain(CountingWriter<W>),
    #[cfg(feature = "deflate")]
    Deflate(DeflateEncoder<CountingWriter<W>>),
    /// An encoder failed to finish and took the sink with it.
    Poisoned,
}

impl<W: Write> Output<W> {
    fn position(&self) -> u64 {
        match self {
            Output::Plain(w) => w.count,
            #[cfg(feature = "deflate")]
            Output::Deflate(e) => e.get_ref().count,
            Output::Poisoned => 0,
        }
    }

    /// Returns the raw sink; only valid between entry data sections.
    fn plain(&mut self) -> Result<&mut CountingWriter<W>> {
        match self {
            Output::Plain(w) => Ok(w),
            _ => Err(Error::WriterState("output is not at a record boundary")),
        }
    }

    fn begin_data(&mut self, method: CompressionMethod, level: u32) {
        #[cfg(feature = "deflate")]
        {
            if method == CompressionMethod::Deflated {
                *self = match mem::replace(self, Output::Poisoned) {
                    Output::Plain(w) => Output::Deflate(DeflateEncoder::new(w, level)),
                    other => other,
                };
            }
        }
        #[cfg(not(feature = "deflate"))]
        let _ = (method, level);
    }

    fn end_data(&mut self) -> io::Result<()> {
        match mem::replace(self, Output::Poisoned) {
            #[cfg(feature = "deflate")]
            Output::Deflate(e) => {
                *self = Output::Plain(e.try_finish()?);
            }
            other => *self = other,
        }
        Ok(())
    }

    fn into_inner(self) -> Option<W> {
        match self {
            Output::Plain(w) => Some(w.inner),
            #[cfg(feature = "deflate")]
            Output::Deflate(e) => e.try_finish().ok().map(|w| w.inner),
            Output::Poisoned => None,
        }
    }
}

impl<W: Write> Write for Output<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Plain(w) => w.write(buf),
            #[cfg(feature = "deflate")]
            Output::Deflate(e) => e.write(buf),
            Output::Poisoned => Err(io::Error::other(Error::WriterState("writer is poisoned"))),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Plain(w) => w.flush(),
            #[cfg(feature = "deflate")]
            Output::Deflate(e) => e.flush(),
            Output::Poisoned => Ok(()),
        }
    }
}

/// The entry currently receiving data.
#[derive(Debug)]
struct OpenEntry {
    name: String,
    raw_name: Vec<u8>,
    flags: u16,
    method: CompressionMethod,
    dos_time: u16,
    dos_date: u16,
    local_header_offset: u64,
    data_start: u64,
    crc: Crc32,
    size: u64,
    expected_crc: Option<u32>,
    expected_size: Option<u64>,
    is_directory: bool,
    extra: Vec<u8>,
    comment: Vec<u8>,
}

impl OpenEntry {
    fn uses_descriptor(&self) -> bool {
        self.flags & flags::DATA_DESCRIPTOR != 0
    }
}

/// A sequential ZIP archive writer.
pub struct Writer<W: Write> {
    output: Output<W>,
    options: WriteOptions,
    encoding: NameEncoding,
    state: WriterState,
    current: Option<OpenEntry>,
    entries: Vec<CentralRecord>,
    stats: WriteResult,
}

impl<W: Write> std::fmt::Debug for Writer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("options", &self.options)
            .field("encoding", &self.encoding)
            .field("state", &self.state)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<W: Write> Writer<W> {
    /// Adds an entry whose content is read from `reader`.
    ///
    /// Returns the number of uncompressed bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be started, reading or writing
    /// fails, or the content does not match a CRC or size in `record`.
    pub fn add_stream(&mut self, record: &EntryRecord, reader: &mut dyn Read) -> Result<u64> {
        self.start_entry(record)?;
        let copied = io::copy(reader, self)?;
        self.finish_entry()?;
        Ok(copied)
    }

    /// Adds a file entry with in-memory content.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    pub fn add_bytes(&mut self, path: ArchivePath, data: &[u8]) -> Result<()> {
        let record = EntryRecord::new(path.into_string())
            .with_size(data.len() as u64)
            .with_crc32(Crc32::compute(data));
        self.add_stream(&record, &mut &data[..])?;
        Ok(())
    }

    /// Adds a directory entry; a trailing `/` is appended to the name.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    pub fn add_directory(&mut self, path: ArchivePath) -> Result<()> {
        let record = EntryRecord::new(path.to_directory().into_string());
        self.start_entry(&record)?;
        self.finish_entry()
    }

    /// Returns true while an entry is open for data.
    pub fn has_open_entry(&self) -> bool {
        self.state == WriterState::EntryOpen
    }

    /// Returns the number of completed entries (files and directories).
    pub fn entries_written(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of bytes emitted so far.
    pub fn bytes_written(&self) -> u64 {
        self.output.position()
    }

    fn ensure_accepting_entries(&self) -> Result<()> {
        match self.state {
            WriterState::AcceptingEntries => Ok(()),
            WriterState::EntryOpen => Err(Error::WriterState("an entry is already open")),
            WriterState::Failed => Err(Error::WriterState("a previous write failed")),
            WriterState::Finished => Err(Error::WriterState("the archive is already finished")),
        }
    }

    fn open_entry(&mut self, record: &EntryRecord) -> Result<OpenEntry> {
        if record.name.is_empty() {
            return Err(Error::InvalidArchivePath("empty entry name".into()));
        }
        let raw_name = self.encoding.encode(&record.name)?.into_owned();
        if raw_name.len() > usize::from(u16::MAX) {
            return Err(Error::InvalidArchivePath(format!(
                "entry name is {} bytes long",
                raw_name.len()
            )));
        }

        let is_directory = record.is_directory();
        let method = if is_directory {
            CompressionMethod::Stored
        } else {
            match record.method.filter(|m| m.is_writable()) {
                Some(method) => method,
                None if self.options.method.is_writable() => self.options.method,
                None => {
                    return Err(Error::UnsupportedMethod {
                        method: self.options.method.id(),
                    });
                }
            }
        };

        let (expected_crc, expected_size) = if is_directory {
            (Some(0), Some(0))
        } else {
            (record.crc32, record.size)
        };

        let mut entry_flags = 0;
        if self.encoding.is_utf8() {
            entry_flags |= flags::UTF8;
        }
        let header_known =
            method == CompressionMethod::Stored && expected_crc.is_some() && expected_size.is_some();
        if !header_known {
            entry_flags |= flags::DATA_DESCRIPTOR;
        }

        let (dos_date, dos_time) = record.mod_time.unwrap_or_else(Timestamp::now).to_dos();

        let extra = record
            .extra
            .as_deref()
            .map(|e| strip(e, ZIP64_HEADER_ID))
            .unwrap_or_default();
        let comment = match record.comment.as_deref() {
            Some(text) => {
                let bytes = self.encoding.encode(text)?.into_owned();
                if bytes.len() > MAX_COMMENT_LENGTH {
                    log::warn!("dropping oversized comment of entry {}", record.name);
                    Vec::new()
                } else {
                    bytes
                }
            }
            None => Vec::new(),
        };

        Ok(OpenEntry {
            name: record.name.clone(),
            raw_name,
            flags: entry_flags,
            method,
            dos_time,
            dos_date,
            local_header_offset: 0,
            data_start: 0,
            crc: Crc32::new(),
            size: 0,
            expected_crc,
            expected_size,
            is_directory,
            extra,
            comment,
        })
    }

    fn write_local(&mut self, entry: &mut OpenEntry) -> Result<()> {
        let sink = self.output.plain()?;
        entry.local_header_offset = sink.count;

        let (crc32, size) = if entry.uses_descriptor() {
            (0, 0)
        } else {
            (
                entry.expected_crc.unwrap_or(0),
                entry.expected_size.unwrap_or(0),
            )
        };
        let zip64 = size >= u64::from(ZIP64_MARKER_32);
        let mut extra = if zip64 {
            zip64_block(&[size, size])
        } else {
            Vec::new()
        };
        if extra.len() + entry.extra.len() <= usize::from(u16::MAX) {
            extra.extend_from_slice(&entry.extra);
        }
        let size32 = if zip64 { ZIP64_MARKER_32 } else { size as u32 };

        let fields = LocalHeaderFields {
            version_needed: if zip64 { version::ZIP64 } else { version::DEFAULT },
            flags: entry.flags,
            method: entry.method.id(),
            dos_time: entry.dos_time,
            dos_date: entry.dos_date,
            crc32,
            compressed_size: size32,
            size: size32,
            name: &entry.raw_name,
            extra: &extra,
        };
        write_local_header(sink, &fields)?;
        entry.data_start = sink.count;
        Ok(())
    }

    fn close_entry(&mut self, mut entry: OpenEntry) -> Result<()> {
        self.output.end_data()?;
        let compressed_size = self.output.position() - entry.data_start;
        let crc32 = entry.crc.finalize();

        if let Some(expected) = entry.expected_size.filter(|&s| s != entry.size) {
            return Err(Error::SizeMismatch {
                name: mem::take(&mut entry.name),
                expected,
                actual: entry.size,
            });
        }
        if let Some(expected) = entry.expected_crc.filter(|&c| c != crc32) {
            return Err(Error::CrcMismatch {
                name: mem::take(&mut entry.name),
                expected,
                actual: crc32,
            });
        }

        if entry.uses_descriptor() {
            write_data_descriptor(self.output.plain()?, crc32, compressed_size, entry.size)?;
        }

        log::debug!(
            "wrote entry {} ({} -> {} bytes, {})",
            entry.name,
            entry.size,
            compressed_size,
            entry.method
        );

        if entry.is_directory {
            self.stats.directories_written += 1;
        } else {
            self.stats.entries_written += 1;
        }
        self.stats.total_size += entry.size;
        self.stats.compressed_size += compressed_size;

        self.entries.push(CentralRecord {
            flags: entry.flags,
            method: entry.method.id(),
            dos_time: entry.dos_time,
            dos_date: entry.dos_date,
            crc32,
            compressed_size,
            size: entry.size,
            local_header_offset: entry.local_header_offset,
            external_attributes: if entry.is_directory {
                DOS_DIRECTORY_ATTRIBUTE
            } else {
                0
            },
            name: entry.raw_name,
            extra: entry.extra,
            comment: entry.comment,
        });
        Ok(())
    }
}

impl<W: Write> EntrySink for Writer<W> {
    fn start_entry(&mut self, record: &EntryRecord) -> Result<()> {
        self.ensure_accepting_entries()?;
        let mut entry = self.open_entry(record)?;
        if let Err(e) = self.write_local(&mut entry) {
            self.state = WriterState::Failed;
            return Err(e);
        }
        self.output.begin_data(entry.method, self.options.level);
        self.current = Some(entry);
        self.state = WriterState::EntryOpen;
        Ok(())
    }

    fn finish_entry(&mut self) -> Result<()> {
        let entry = match (self.state, self.current.take()) {
            (WriterState::EntryOpen, Some(entry)) => entry,
            _ => return Err(Error::WriterState("no entry is open")),
        };
        match self.close_entry(entry) {
            Ok(()) => {
                self.state = WriterState::AcceptingEntries;
                Ok(())
            }
            Err(e) => {
                self.state = WriterState::Failed;
                Err(e)
            }
        }
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let entry = match (self.state, self.current.as_mut()) {
            (WriterState::EntryOpen, Some(entry)) => entry,
            _ => return Err(io::Error::other(Error::WriterState("no entry is open"))),
        };
        if buf.is_empty() {
            return Ok(0);
        }
        if entry.is_directory {
            return Err(io::Error::other(Error::WriterState(
                "directory entries cannot hold data",
            )));
        }
        let n = self.output.write(buf)?;
        entry.crc.update(&buf[..n]);
        entry.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::Archive;
    use std::io::Cursor;

    fn path(s: &str) -> ArchivePath {
        ArchivePath::new(s).unwrap()
    }

    fn stored() -> WriteOptions {
        WriteOptions::new().method(CompressionMethod::Stored)
    }

    #[test]
    fn test_writer_create() {
        let writer = Writer::create(Vec::new()).unwrap();
        assert_eq!(writer.state, WriterState::AcceptingEntries);
        assert_eq!(writer.bytes_written(), 0);
    }

    #[test]
    fn test_writer_options() {
        let writer = Writer::create(Vec::new())
            .unwrap()
            .options(WriteOptions::new().level(9).unwrap());
        assert_eq!(writer.options.level, 9);
    }

    #[test]
    fn test_empty_archive() {
        let writer = Writer::create(Vec::new()).unwrap();
        let (result, data) = writer.finish_into_inner().unwrap();
        assert_eq!(result.entries_written, 0);
        assert_eq!(data.len(), 22);
        let archive = Archive::open(Cursor::new(data)).unwrap();
        assert!(archive.is_empty());
    }

    #[test]
    fn test_stored_known_entry_has_no_descriptor() {
        let mut writer = Writer::create(Vec::new()).unwrap().options(stored());
        writer.add_bytes(path("a.txt"), b"abc").unwrap();
        let (_, data) = writer.finish_into_inner().unwrap();
        let general_flags = u16::from_le_bytes([data[6], data[7]]);
        assert_eq!(general_flags & flags::DATA_DESCRIPTOR, 0);
        assert_eq!(&data[35..38], b"abc");
        // central header follows the data directly
        assert_eq!(&data[38..42], b"PK\x01\x02");
    }

    #[test]
    fn test_streamed_entry_uses_descriptor() {
        let mut writer = Writer::create(Vec::new()).unwrap().options(stored());
        writer.start_entry(&EntryRecord::new("s.txt")).unwrap();
        writer.write_all(b"streamed").unwrap();
        writer.finish_entry().unwrap();
        let (_, data) = writer.finish_into_inner().unwrap();

        let general_flags = u16::from_le_bytes([data[6], data[7]]);
        assert_ne!(general_flags & flags::DATA_DESCRIPTOR, 0);
        assert_eq!(&data[43..47], b"PK\x07\x08");

        let mut archive = Archive::open(Cursor::new(data)).unwrap();
        assert_eq!(archive.read_to_vec("s.txt").unwrap(), b"streamed");
        assert_eq!(archive.entry("s.txt").unwrap().size(), 8);
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn test_deflated_roundtrip() {
        let content = b"compressible ".repeat(200);
        let mut writer = Writer::create(Vec::new()).unwrap();
        writer.add_bytes(path("c.txt"), &content).unwrap();
        let (result, data) = writer.finish_into_inner().unwrap();
        assert!(result.compressed_size < result.total_size);

        let mut archive = Archive::open(Cursor::new(data)).unwrap();
        assert_eq!(archive.read_to_vec("c.txt").unwrap(), content);
    }

    #[test]
    fn test_directory_entry() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        writer.add_directory(path("docs")).unwrap();
        let (result, data) = writer.finish_into_inner().unwrap();
        assert_eq!(result.directories_written, 1);
        assert_eq!(result.entries_written, 0);

        let archive = Archive::open(Cursor::new(data)).unwrap();
        let entry = archive.entry("docs/").unwrap();
        assert!(entry.is_directory());
        assert_eq!(entry.method(), CompressionMethod::Stored);
        assert_eq!(entry.external_attributes & DOS_DIRECTORY_ATTRIBUTE, 0x10);
    }

    #[test]
    fn test_directory_rejects_data() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        writer.start_entry(&EntryRecord::new("d/")).unwrap();
        assert!(writer.write_all(b"x").is_err());
    }

    #[test]
    fn test_write_without_entry_fails() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        assert!(writer.write_all(b"x").is_err());
        assert!(matches!(writer.finish_entry(), Err(Error::WriterState(_))));
    }

    #[test]
    fn test_nested_start_fails() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        writer.start_entry(&EntryRecord::new("a")).unwrap();
        assert!(matches!(
            writer.start_entry(&EntryRecord::new("b")),
            Err(Error::WriterState(_))
        ));
        assert!(writer.has_open_entry());
    }

    #[test]
    fn test_finish_closes_open_entry() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        writer.start_entry(&EntryRecord::new("open.txt")).unwrap();
        writer.write_all(b"tail").unwrap();
        let (result, data) = writer.finish_into_inner().unwrap();
        assert_eq!(result.entries_written, 1);
        let mut archive = Archive::open(Cursor::new(data)).unwrap();
        assert_eq!(archive.read_to_vec("open.txt").unwrap(), b"tail");
    }

    #[test]
    fn test_crc_mismatch_is_reported() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        let record = EntryRecord::new("x.bin").with_crc32(1).with_size(3);
        let err = writer.add_stream(&record, &mut &b"abc"[..]).unwrap_err();
        assert!(matches!(err, Error::CrcMismatch { expected: 1, .. }));
    }

    #[test]
    fn test_size_mismatch_is_reported() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        let record = EntryRecord::new("x.bin").with_size(10);
        let err = writer.add_stream(&record, &mut &b"abc"[..]).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 10,
                actual: 3,
                ..
            }
        ));
        assert!(matches!(
            writer.start_entry(&EntryRecord::new("y")),
            Err(Error::WriterState(_))
        ));
    }

    #[test]
    fn test_metadata_is_carried() {
        let mod_time = Timestamp::from_unix_secs(1_600_000_000);
        let record = EntryRecord::new("meta.txt")
            .with_mod_time(mod_time)
            .with_comment("entry comment")
            .with_extra(vec![0x55, 0x54, 0x01, 0x00, 0x07]);
        let mut writer = Writer::create(Vec::new())
            .unwrap()
            .options(WriteOptions::new().comment("archive comment"));
        writer.add_stream(&record, &mut &b"m"[..]).unwrap();
        let (_, data) = writer.finish_into_inner().unwrap();

        let archive = Archive::open(Cursor::new(data)).unwrap();
        assert_eq!(archive.comment(), Some("archive comment"));
        let entry = archive.entry("meta.txt").unwrap();
        assert_eq!(entry.modified(), Some(mod_time));
        assert_eq!(entry.record.comment.as_deref(), Some("entry comment"));
        assert_eq!(
            entry.record.extra.as_deref(),
            Some(&[0x55, 0x54, 0x01, 0x00, 0x07][..])
        );
    }

    #[test]
    fn test_unmappable_name_is_rejected() {
        let encoding = NameEncoding::for_label("windows-1252").unwrap();
        let mut writer = Writer::create(Vec::new()).unwrap().encoding(encoding);
        let err = writer.start_entry(&EntryRecord::new("日本.txt")).unwrap_err();
        assert!(matches!(err, Error::NameEncoding { .. }));
    }

    #[test]
    fn test_legacy_encoding_roundtrip() {
        let encoding = NameEncoding::for_label("shift_jis").unwrap();
        let mut writer = Writer::create(Vec::new()).unwrap().encoding(encoding);
        writer.add_bytes(path("日本.txt"), b"jp").unwrap();
        let (_, data) = writer.finish_into_inner().unwrap();

        let general_flags = u16::from_le_bytes([data[6], data[7]]);
        assert_eq!(general_flags & flags::UTF8, 0);
        let mut archive = Archive::open_with_encoding(Cursor::new(data), encoding).unwrap();
        assert_eq!(archive.read_to_vec("日本.txt").unwrap(), b"jp");
    }

    #[test]
    fn test_unsupported_method_falls_back_to_default() {
        let record = EntryRecord::new("b.bz2").with_method(CompressionMethod::Other(12));
        let mut writer = Writer::create(Vec::new()).unwrap().options(stored());
        writer.add_stream(&record, &mut &b"data"[..]).unwrap();
        let (_, data) = writer.finish_into_inner().unwrap();
        let archive = Archive::open(Cursor::new(data)).unwrap();
        assert_eq!(
            archive.entry("b.bz2").unwrap().method(),
            CompressionMethod::Stored
        );
    }
}
