//! Archive opening methods.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::codec::CompressionMethod;
use crate::encoding::NameEncoding;
use crate::format::central::{CentralEntry, read_central_directory, read_end_record};
use crate::format::flags;
use crate::record::EntryRecord;
use crate::timestamp::Timestamp;
use crate::{Error, Result};

use super::{Archive, Entry};

impl Archive<BufReader<File>> {
    /// Opens an archive from a file path, decoding non-UTF-8 names as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a valid ZIP
    /// archive.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_path_with_encoding(path, NameEncoding::default())
    }

    /// Opens an archive from a file path with the given name encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a valid ZIP
    /// archive.
    pub fn open_path_with_encoding(path: impl AsRef<Path>, encoding: NameEncoding) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open_with_encoding(BufReader::new(file), encoding)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Opens an archive from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a valid ZIP archive.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_encoding(reader, NameEncoding::default())
    }

    /// Opens an archive from a reader, decoding names that lack the UTF-8
    /// flag with `encoding`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a valid ZIP archive or a name is
    /// malformed for the encoding.
    pub fn open_with_encoding(mut reader: R, encoding: NameEncoding) -> Result<Self> {
        let end = read_end_record(&mut reader)?;
        let central = read_central_directory(&mut reader, &end)?;

        let mut entries = Vec::with_capacity(central.len());
        let mut index = HashMap::with_capacity(central.len());
        for (i, raw) in central.into_iter().enumerate() {
            let entry = build_entry(raw, i, end.base_offset, encoding)?;
            index.entry(entry.record.name.clone()).or_insert(i);
            entries.push(entry);
        }

        let comment = if end.comment.is_empty() {
            None
        } else {
            Some(encoding.decode_lossy(&end.comment, false))
        };

        log::debug!(
            "opened ZIP archive with {} entries{}",
            entries.len(),
            if end.zip64 { " (ZIP64)" } else { "" }
        );

        Ok(Self {
            reader,
            entries,
            index,
            comment,
            encoding,
            base_offset: end.base_offset,
        })
    }
}

fn build_entry(
    raw: CentralEntry,
    index: usize,
    base_offset: u64,
    encoding: NameEncoding,
) -> Result<Entry> {
    let utf8 = raw.flags & flags::UTF8 != 0;
    let name = encoding.decode(&raw.raw_name, utf8)?;
    let comment = (!raw.raw_comment.is_empty()).then(|| encoding.decode_lossy(&raw.raw_comment, utf8));
    let extra = (!raw.extra.is_empty()).then_some(raw.extra);
    let local_header_offset = base_offset
        .checked_add(raw.local_header_offset)
        .ok_or_else(|| Error::CorruptHeader {
            offset: raw.local_header_offset,
            reason: format!("local header offset overflows after a {base_offset}-byte prefix"),
        })?;

    let record = EntryRecord {
        name,
        mod_time: Timestamp::from_dos(raw.dos_date, raw.dos_time),
        crc32: Some(raw.crc32),
        size: Some(raw.size),
        compressed_size: Some(raw.compressed_size),
        method: Some(CompressionMethod::from_id(raw.method)),
        extra,
        comment,
    };

    Ok(Entry {
        record,
        flags: raw.flags,
        external_attributes: raw.external_attributes,
        index,
        local_header_offset,
    })
}
