//! Writer initialization and finalization.
//!
//! This module provides methods for creating writers and finishing archive
//! writing, including the central directory and end records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::encoding::NameEncoding;
use crate::format::MAX_COMMENT_LENGTH;
use crate::record::EntryRecord;
use crate::{Error, Result};

use super::header_encode::{write_central_header, write_end_records};
use super::options::{WriteOptions, WriteResult};
use super::{CountingWriter, EntrySink, Output, Writer, WriterState};

impl Writer<BufWriter<File>> {
    /// Creates a new archive file at the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the archive file to create
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(Error::Io)?;
        Self::create(BufWriter::new(file))
    }
}

impl<W: Write> Writer<W> {
    /// Creates a new archive writer.
    ///
    /// Nothing is written until the first entry is started.
    ///
    /// # Arguments
    ///
    /// * `sink` - The writer to output archive data to
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature matches [`create_path`](Writer::create_path).
    pub fn create(sink: W) -> Result<Self> {
        Ok(Self {
            output: Output::Plain(CountingWriter {
                inner: sink,
                count: 0,
            }),
            options: WriteOptions::default(),
            encoding: NameEncoding::default(),
            state: WriterState::AcceptingEntries,
            current: None,
            entries: Vec::new(),
            stats: WriteResult::default(),
        })
    }

    /// Sets the write options.
    pub fn options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the charset for entry names and comments.
    ///
    /// With UTF-8 (the default) entries carry the language encoding flag.
    pub fn encoding(mut self, encoding: NameEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Finishes writing the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the central directory cannot be written.
    pub fn finish(self) -> Result<WriteResult> {
        let (result, _sink) = self.finish_into_inner()?;
        Ok(result)
    }

    /// Finishes writing the archive and returns the underlying sink.
    ///
    /// An entry still open is finished first.
    ///
    /// # Errors
    ///
    /// Returns an error if the open entry cannot be finished, a previous
    /// write failed, or the central directory cannot be written.
    pub fn finish_into_inner(mut self) -> Result<(WriteResult, W)> {
        let stats = self.write_directory()?;
        Ok((stats, self.into_sink()?))
    }

    /// Returns the sink once the directory has been written.
    pub(crate) fn into_sink(self) -> Result<W> {
        self.output
            .into_inner()
            .ok_or(Error::WriterState("writer is poisoned"))
    }

    /// Writes the central directory and end records, leaving the sink in
    /// place so a failed finish can still hand it back through
    /// [`abandon`](Self::abandon).
    pub(crate) fn write_directory(&mut self) -> Result<WriteResult> {
        if self.state == WriterState::EntryOpen {
            self.finish_entry()?;
        }
        self.ensure_accepting_entries()?;

        let comment = match self.options.comment.as_deref() {
            Some(text) => self.encoding.encode(text)?.into_owned(),
            None => Vec::new(),
        };
        if comment.len() > MAX_COMMENT_LENGTH {
            return Err(Error::InvalidConfiguration(format!(
                "archive comment is {} bytes long",
                comment.len()
            )));
        }

        let sink = self.output.plain()?;
        let directory_offset = sink.count;
        for record in &self.entries {
            write_central_header(sink, record)?;
        }
        let directory_size = sink.count - directory_offset;
        write_end_records(
            sink,
            self.entries.len() as u64,
            directory_offset,
            directory_size,
            &comment,
        )?;
        sink.flush()?;

        let mut stats = self.stats.clone();
        stats.archive_size = sink.count;
        self.state = WriterState::Finished;
        log::debug!(
            "finished ZIP archive: {} entries, {} bytes",
            self.entries.len(),
            stats.archive_size
        );
        Ok(stats)
    }

    /// Discards the archive under construction and returns the sink, if it
    /// is still intact.
    ///
    /// The bytes already written are left as they are; the result is not a
    /// valid archive.
    pub fn abandon(self) -> Option<W> {
        self.output.into_inner()
    }
}

impl<W: Write> Writer<W> {
    /// Adds one entry described by `record`, taking content from `data`.
    ///
    /// Shorthand for [`add_stream`](Self::add_stream) over a byte slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    pub fn add_record(&mut self, record: &EntryRecord, data: &[u8]) -> Result<()> {
        self.add_stream(record, &mut &data[..])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchivePath;
    use crate::read::Archive;
    use std::io::Cursor;

    #[test]
    fn test_create_path_and_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.zip");
        let mut writer = Writer::create_path(&path).unwrap();
        writer
            .add_bytes(ArchivePath::new("f.txt").unwrap(), b"file")
            .unwrap();
        let result = writer.finish().unwrap();
        assert_eq!(result.entries_written, 1);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), result.archive_size);

        let mut archive = Archive::open_path(&path).unwrap();
        assert_eq!(archive.read_to_vec("f.txt").unwrap(), b"file");
    }

    #[test]
    fn test_abandon_returns_sink() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        writer
            .add_bytes(ArchivePath::new("f.txt").unwrap(), b"file")
            .unwrap();
        let data = writer.abandon().unwrap();
        assert!(!data.is_empty());
        assert!(Archive::open(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_add_record() {
        let mut writer = Writer::create(Vec::new()).unwrap();
        writer
            .add_record(&EntryRecord::new("r.txt").with_comment("c"), b"rec")
            .unwrap();
        let (_, data) = writer.finish_into_inner().unwrap();
        let mut archive = Archive::open(Cursor::new(data)).unwrap();
        assert_eq!(archive.read_to_vec("r.txt").unwrap(), b"rec");
    }
}
