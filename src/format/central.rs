//! Central directory and end records.
//!
//! Locating the central directory works backwards from the end of the file:
//! the end of central directory record sits in the last `22 + 65535` bytes,
//! optionally preceded by a ZIP64 locator pointing at the ZIP64 end record.
//!
//! Offsets stored in an archive are relative to the start of the ZIP data.
//! When bytes were prepended (a self-extractor stub, for instance) the real
//! positions are shifted; the shift is recovered by comparing where the
//! central directory actually ends with where the records claim it starts.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use super::extra::{self, ZIP64_HEADER_ID, Zip64Needs};
use super::reader::{read_bytes, read_u16_le, read_u32_le, read_u64_le};
use super::{
    CENTRAL_HEADER_SIZE, END_RECORD_SIZE, MAX_COMMENT_LENGTH, ZIP64_END_RECORD_SIZE,
    ZIP64_LOCATOR_SIZE, ZIP64_MARKER_16, ZIP64_MARKER_32, signature,
};
use crate::{Error, Result};

/// Summary of the end of central directory record(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndRecord {
    /// Total number of entries in the central directory.
    pub entry_count: u64,
    /// Size of the central directory in bytes.
    pub directory_size: u64,
    /// Offset of the central directory as recorded (relative).
    pub directory_offset: u64,
    /// Number of bytes preceding the ZIP data.
    pub base_offset: u64,
    /// Raw archive comment.
    pub comment: Vec<u8>,
    /// True if ZIP64 end records were present.
    pub zip64: bool,
}

impl EndRecord {
    /// Absolute position of the first central directory header.
    pub fn directory_start(&self) -> u64 {
        self.base_offset + self.directory_offset
    }
}

/// One central directory file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralEntry {
    /// Version made by (host system in the high byte).
    pub version_made_by: u16,
    /// General-purpose flags.
    pub flags: u16,
    /// Compression method id.
    pub method: u16,
    /// MS-DOS modification time.
    pub dos_time: u16,
    /// MS-DOS modification date.
    pub dos_date: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size, ZIP64 resolved.
    pub compressed_size: u64,
    /// Uncompressed size, ZIP64 resolved.
    pub size: u64,
    /// Local header offset (relative), ZIP64 resolved.
    pub local_header_offset: u64,
    /// External file attributes.
    pub external_attributes: u32,
    /// Raw name bytes.
    pub raw_name: Vec<u8>,
    /// Raw extra field.
    pub extra: Vec<u8>,
    /// Raw comment bytes.
    pub raw_comment: Vec<u8>,
}

fn multi_disk() -> Error {
    Error::UnsupportedFeature {
        feature: "multi-disk archives",
    }
}

fn truncated(offset: u64, what: &str) -> impl FnOnce(io::Error) -> Error + '_ {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::CorruptHeader {
                offset,
                reason: format!("truncated {}", what),
            }
        } else {
            Error::Io(e)
        }
    }
}

/// Finds and parses the end of central directory record(s).
///
/// # Errors
///
/// - [`Error::InvalidFormat`] if no end record exists (not a ZIP archive)
/// - [`Error::UnsupportedFeature`] for multi-disk archives
/// - [`Error::CorruptHeader`] if the records are inconsistent
pub fn read_end_record<R: Read + Seek>(reader: &mut R) -> Result<EndRecord> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    if file_len < END_RECORD_SIZE as u64 {
        return Err(Error::InvalidFormat(
            "file too small to be a ZIP archive".into(),
        ));
    }

    let tail_len = file_len.min((END_RECORD_SIZE + MAX_COMMENT_LENGTH) as u64);
    let tail_start = file_len - tail_len;
    reader.seek(SeekFrom::Start(tail_start))?;
    let tail = read_bytes(reader, tail_len as usize)?;

    let sig = signature::END_OF_CENTRAL_DIRECTORY.to_le_bytes();
    let found = (0..=tail.len() - END_RECORD_SIZE).rev().find(|&i| {
        if tail[i..i + 4] != sig {
            return false;
        }
        let comment_len = usize::from(u16::from_le_bytes([tail[i + 20], tail[i + 21]]));
        i + END_RECORD_SIZE + comment_len <= tail.len()
    });
    let Some(index) = found else {
        return Err(Error::InvalidFormat(
            "end of central directory record not found".into(),
        ));
    };
    let end_pos = tail_start + index as u64;

    let mut cursor = Cursor::new(&tail[index + 4..]);
    let disk = read_u16_le(&mut cursor)?;
    let directory_disk = read_u16_le(&mut cursor)?;
    let entries_on_disk = read_u16_le(&mut cursor)?;
    let entries_total = read_u16_le(&mut cursor)?;
    let directory_size = read_u32_le(&mut cursor)?;
    let directory_offset = read_u32_le(&mut cursor)?;
    let comment_len = read_u16_le(&mut cursor)?;
    let comment = read_bytes(&mut cursor, usize::from(comment_len))?;

    if (disk != 0 && disk != ZIP64_MARKER_16)
        || (directory_disk != 0 && directory_disk != ZIP64_MARKER_16)
        || entries_on_disk != entries_total
    {
        return Err(multi_disk());
    }

    let mut record = EndRecord {
        entry_count: u64::from(entries_total),
        directory_size: u64::from(directory_size),
        directory_offset: u64::from(directory_offset),
        base_offset: 0,
        comment,
        zip64: false,
    };

    let mut directory_end = end_pos;
    if let Some(zip64_pos) = read_zip64_end_record(reader, end_pos, &mut record)? {
        directory_end = zip64_pos;
    }

    record.base_offset = directory_end
        .checked_sub(record.directory_size)
        .and_then(|v| v.checked_sub(record.directory_offset))
        .ok_or_else(|| Error::CorruptHeader {
            offset: end_pos,
            reason: "central directory extends before start of file".into(),
        })?;

    if record.base_offset > 0 {
        log::debug!(
            "{} bytes precede the ZIP data; adjusting offsets",
            record.base_offset
        );
    }

    Ok(record)
}

/// Reads the ZIP64 locator and end record if present, updating `record`.
///
/// Returns the absolute position of the ZIP64 end record.
fn read_zip64_end_record<R: Read + Seek>(
    reader: &mut R,
    end_pos: u64,
    record: &mut EndRecord,
) -> Result<Option<u64>> {
    let Some(locator_pos) = end_pos.checked_sub(ZIP64_LOCATOR_SIZE as u64) else {
        return Ok(None);
    };
    reader.seek(SeekFrom::Start(locator_pos))?;
    let locator = read_bytes(reader, ZIP64_LOCATOR_SIZE)?;
    let mut cursor = Cursor::new(&locator[..]);
    if read_u32_le(&mut cursor)? != signature::ZIP64_END_LOCATOR {
        return Ok(None);
    }
    let _record_disk = read_u32_le(&mut cursor)?;
    let recorded_offset = read_u64_le(&mut cursor)?;
    let total_disks = read_u32_le(&mut cursor)?;
    if total_disks > 1 {
        return Err(multi_disk());
    }

    // With prepended data the recorded offset is short by the prefix length;
    // the record normally sits right before the locator.
    let mut candidates = vec![recorded_offset];
    if let Some(adjacent) = locator_pos.checked_sub(ZIP64_END_RECORD_SIZE as u64) {
        if adjacent != recorded_offset {
            candidates.push(adjacent);
        }
    }

    for candidate in candidates {
        if candidate
            .checked_add(ZIP64_END_RECORD_SIZE as u64)
            .is_none_or(|stop| stop > locator_pos)
        {
            continue;
        }
        reader.seek(SeekFrom::Start(candidate))?;
        let data = read_bytes(reader, ZIP64_END_RECORD_SIZE)?;
        let mut cursor = Cursor::new(&data[..]);
        if read_u32_le(&mut cursor)? != signature::ZIP64_END_OF_CENTRAL_DIRECTORY {
            continue;
        }
        let _record_size = read_u64_le(&mut cursor)?;
        let _version_made_by = read_u16_le(&mut cursor)?;
        let _version_needed = read_u16_le(&mut cursor)?;
        let disk = read_u32_le(&mut cursor)?;
        let directory_disk = read_u32_le(&mut cursor)?;
        let entries_on_disk = read_u64_le(&mut cursor)?;
        let entries_total = read_u64_le(&mut cursor)?;
        if disk != 0 || directory_disk != 0 || entries_on_disk != entries_total {
            return Err(multi_disk());
        }
        record.entry_count = entries_total;
        record.directory_size = read_u64_le(&mut cursor)?;
        record.directory_offset = read_u64_le(&mut cursor)?;
        record.zip64 = true;
        return Ok(Some(candidate));
    }

    Err(Error::CorruptHeader {
        offset: locator_pos,
        reason: "ZIP64 end of central directory record not found".into(),
    })
}

/// Reads all central directory headers described by `end`.
///
/// # Errors
///
/// Returns [`Error::CorruptHeader`] if a header is missing or truncated, or
/// if the directory does not fit in the file.
pub fn read_central_directory<R: Read + Seek>(
    reader: &mut R,
    end: &EndRecord,
) -> Result<Vec<CentralEntry>> {
    let start = end.directory_start();
    let file_len = reader.seek(SeekFrom::End(0))?;
    if start
        .checked_add(end.directory_size)
        .is_none_or(|stop| stop > file_len)
    {
        return Err(Error::CorruptHeader {
            offset: start,
            reason: "central directory extends past end of file".into(),
        });
    }
    if end.entry_count > end.directory_size / CENTRAL_HEADER_SIZE as u64 {
        return Err(Error::CorruptHeader {
            offset: start,
            reason: format!(
                "{} entries cannot fit in a {}-byte central directory",
                end.entry_count, end.directory_size
            ),
        });
    }

    let size = usize::try_from(end.directory_size)
        .map_err(|_| Error::InvalidFormat("central directory too large".into()))?;
    reader.seek(SeekFrom::Start(start))?;
    let data = read_bytes(reader, size).map_err(truncated(start, "central directory"))?;

    let mut cursor = Cursor::new(&data[..]);
    let mut entries = Vec::with_capacity(end.entry_count as usize);
    for _ in 0..end.entry_count {
        let offset = start + cursor.position();
        let entry = read_central_entry(&mut cursor, offset)?;
        entries.push(entry);
    }
    Ok(entries)
}

fn read_central_entry(cursor: &mut Cursor<&[u8]>, offset: u64) -> Result<CentralEntry> {
    let map = |e: io::Error| truncated(offset, "central directory header")(e);

    if read_u32_le(cursor).map_err(map)? != signature::CENTRAL_DIRECTORY {
        return Err(Error::CorruptHeader {
            offset,
            reason: "missing central directory header signature".into(),
        });
    }

    let mut fixed = [0u8; CENTRAL_HEADER_SIZE - 4];
    cursor.read_exact(&mut fixed).map_err(map)?;
    let mut f = Cursor::new(&fixed[..]);
    let version_made_by = read_u16_le(&mut f)?;
    let _version_needed = read_u16_le(&mut f)?;
    let flags = read_u16_le(&mut f)?;
    let method = read_u16_le(&mut f)?;
    let dos_time = read_u16_le(&mut f)?;
    let dos_date = read_u16_le(&mut f)?;
    let crc32 = read_u32_le(&mut f)?;
    let compressed_size = read_u32_le(&mut f)?;
    let size = read_u32_le(&mut f)?;
    let name_len = read_u16_le(&mut f)?;
    let extra_len = read_u16_le(&mut f)?;
    let comment_len = read_u16_le(&mut f)?;
    let disk_start = read_u16_le(&mut f)?;
    let _internal_attributes = read_u16_le(&mut f)?;
    let external_attributes = read_u32_le(&mut f)?;
    let local_header_offset = read_u32_le(&mut f)?;

    let raw_name = read_bytes(cursor, usize::from(name_len)).map_err(map)?;
    let extra = read_bytes(cursor, usize::from(extra_len)).map_err(map)?;
    let raw_comment = read_bytes(cursor, usize::from(comment_len)).map_err(map)?;

    let needs = Zip64Needs {
        size: size == ZIP64_MARKER_32,
        compressed_size: compressed_size == ZIP64_MARKER_32,
        local_header_offset: local_header_offset == ZIP64_MARKER_32,
        disk: disk_start == ZIP64_MARKER_16,
    };
    let mut entry = CentralEntry {
        version_made_by,
        flags,
        method,
        dos_time,
        dos_date,
        crc32,
        compressed_size: u64::from(compressed_size),
        size: u64::from(size),
        local_header_offset: u64::from(local_header_offset),
        external_attributes,
        raw_name,
        extra,
        raw_comment,
    };

    if !needs.is_empty() {
        let fields = extra::find(&entry.extra, ZIP64_HEADER_ID)
            .and_then(|data| extra::parse_zip64(data, needs))
            .ok_or_else(|| Error::CorruptHeader {
                offset,
                reason: "missing or short ZIP64 extra field".into(),
            })?;
        if let Some(v) = fields.size {
            entry.size = v;
        }
        if let Some(v) = fields.compressed_size {
            entry.compressed_size = v;
        }
        if let Some(v) = fields.local_header_offset {
            entry.local_header_offset = v;
        }
        if fields.disk.is_some_and(|d| d != 0) {
            return Err(multi_disk());
        }
    } else if disk_start != 0 {
        return Err(multi_disk());
    }

    Ok(entry)
}
