//! Header encoding for ZIP archives.
//!
//! Local headers and data descriptors are written as entries stream by;
//! central directory headers and the end records are written by
//! `finish_into_inner` from the [`CentralRecord`]s collected on the way.

use std::io::{self, Write};

use crate::format::extra::zip64_block;
use crate::format::reader::{clamp_u16, clamp_u32, write_u16_le, write_u32_le, write_u64_le};
use crate::format::{
    CENTRAL_HEADER_SIZE, END_RECORD_SIZE, LOCAL_HEADER_SIZE, ZIP64_END_RECORD_SIZE,
    ZIP64_LOCATOR_SIZE, ZIP64_MARKER_16, ZIP64_MARKER_32, signature, version,
};

/// Fields of a local file header.
#[derive(Debug, Clone)]
pub(crate) struct LocalHeaderFields<'a> {
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub dos_time: u16,
    pub dos_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub size: u32,
    pub name: &'a [u8],
    pub extra: &'a [u8],
}

/// Everything needed to write one central directory header.
#[derive(Debug, Clone)]
pub(crate) struct CentralRecord {
    pub flags: u16,
    pub method: u16,
    pub dos_time: u16,
    pub dos_date: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub size: u64,
    pub local_header_offset: u64,
    pub external_attributes: u32,
    pub name: Vec<u8>,
    /// Carried extra blocks, ZIP64 already removed.
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
}

/// Writes a local file header; returns the number of bytes written.
pub(crate) fn write_local_header<W: Write>(w: &mut W, h: &LocalHeaderFields<'_>) -> io::Result<u64> {
    write_u32_le(w, signature::LOCAL_FILE_HEADER)?;
    write_u16_le(w, h.version_needed)?;
    write_u16_le(w, h.flags)?;
    write_u16_le(w, h.method)?;
    write_u16_le(w, h.dos_time)?;
    write_u16_le(w, h.dos_date)?;
    write_u32_le(w, h.crc32)?;
    write_u32_le(w, h.compressed_size)?;
    write_u32_le(w, h.size)?;
    write_u16_le(w, h.name.len() as u16)?;
    write_u16_le(w, h.extra.len() as u16)?;
    w.write_all(h.name)?;
    w.write_all(h.extra)?;
    Ok((LOCAL_HEADER_SIZE + h.name.len() + h.extra.len()) as u64)
}

/// Writes a data descriptor (with signature).
///
/// Sizes take 8 bytes each when either overflows 32 bits.
pub(crate) fn write_data_descriptor<W: Write>(
    w: &mut W,
    crc32: u32,
    compressed_size: u64,
    size: u64,
) -> io::Result<u64> {
    write_u32_le(w, signature::DATA_DESCRIPTOR)?;
    write_u32_le(w, crc32)?;
    if compressed_size >= u64::from(ZIP64_MARKER_32) || size >= u64::from(ZIP64_MARKER_32) {
        write_u64_le(w, compressed_size)?;
        write_u64_le(w, size)?;
        Ok(24)
    } else {
        write_u32_le(w, compressed_size as u32)?;
        write_u32_le(w, size as u32)?;
        Ok(16)
    }
}

impl CentralRecord {
    /// Values that need the ZIP64 block, in mandated order.
    fn zip64_values(&self) -> Vec<u64> {
        let marker = u64::from(ZIP64_MARKER_32);
        [self.size, self.compressed_size, self.local_header_offset]
            .into_iter()
            .filter(|&v| v >= marker)
            .collect()
    }

    /// Returns the full extra field for the central header.
    fn central_extra(&self) -> Vec<u8> {
        let values = self.zip64_values();
        let mut extra = if values.is_empty() {
            Vec::new()
        } else {
            zip64_block(&values)
        };
        if extra.len() + self.extra.len() <= usize::from(u16::MAX) {
            extra.extend_from_slice(&self.extra);
        } else {
            log::warn!(
                "dropping {} bytes of extra data that no longer fit the central header",
                self.extra.len()
            );
        }
        extra
    }
}

/// Writes a central directory header; returns the number of bytes written.
pub(crate) fn write_central_header<W: Write>(w: &mut W, r: &CentralRecord) -> io::Result<u64> {
    let zip64 = !r.zip64_values().is_empty();
    let extra = r.central_extra();
    let version_needed = if zip64 { version::ZIP64 } else { version::DEFAULT };

    write_u32_le(w, signature::CENTRAL_DIRECTORY)?;
    write_u16_le(w, version::ZIP64)?; // made by: MS-DOS host, spec 4.5
    write_u16_le(w, version_needed)?;
    write_u16_le(w, r.flags)?;
    write_u16_le(w, r.method)?;
    write_u16_le(w, r.dos_time)?;
    write_u16_le(w, r.dos_date)?;
    write_u32_le(w, r.crc32)?;
    write_u32_le(w, clamp_u32(r.compressed_size))?;
    write_u32_le(w, clamp_u32(r.size))?;
    write_u16_le(w, r.name.len() as u16)?;
    write_u16_le(w, extra.len() as u16)?;
    write_u16_le(w, r.comment.len() as u16)?;
    write_u16_le(w, 0)?; // disk number start
    write_u16_le(w, 0)?; // internal attributes
    write_u32_le(w, r.external_attributes)?;
    write_u32_le(w, clamp_u32(r.local_header_offset))?;
    w.write_all(&r.name)?;
    w.write_all(&extra)?;
    w.write_all(&r.comment)?;
    Ok((CENTRAL_HEADER_SIZE + r.name.len() + extra.len() + r.comment.len()) as u64)
}

/// Writes the end of central directory record, preceded by the ZIP64 end
/// record and locator when any value overflows.
///
/// `directory_offset` is where the central directory starts and
/// `directory_size` its length; the ZIP64 record goes right after it.
pub(crate) fn write_end_records<W: Write>(
    w: &mut W,
    entry_count: u64,
    directory_offset: u64,
    directory_size: u64,
    comment: &[u8],
) -> io::Result<u64> {
    let needs_zip64 = entry_count >= u64::from(ZIP64_MARKER_16)
        || directory_offset >= u64::from(ZIP64_MARKER_32)
        || directory_size >= u64::from(ZIP64_MARKER_32);

    let mut written = 0;
    if needs_zip64 {
        let record_offset = directory_offset + directory_size;
        write_u32_le(w, signature::ZIP64_END_OF_CENTRAL_DIRECTORY)?;
        write_u64_le(w, (ZIP64_END_RECORD_SIZE - 12) as u64)?;
        write_u16_le(w, version::ZIP64)?;
        write_u16_le(w, version::ZIP64)?;
        write_u32_le(w, 0)?;
        write_u32_le(w, 0)?;
        write_u64_le(w, entry_count)?;
        write_u64_le(w, entry_count)?;
        write_u64_le(w, directory_size)?;
        write_u64_le(w, directory_offset)?;

        write_u32_le(w, signature::ZIP64_END_LOCATOR)?;
        write_u32_le(w, 0)?;
        write_u64_le(w, record_offset)?;
        write_u32_le(w, 1)?;
        written += (ZIP64_END_RECORD_SIZE + ZIP64_LOCATOR_SIZE) as u64;
    }

    let count = clamp_u16(entry_count);
    write_u32_le(w, signature::END_OF_CENTRAL_DIRECTORY)?;
    write_u16_le(w, 0)?;
    write_u16_le(w, 0)?;
    write_u16_le(w, count)?;
    write_u16_le(w, count)?;
    write_u32_le(w, clamp_u32(directory_size))?;
    write_u32_le(w, clamp_u32(directory_offset))?;
    write_u16_le(w, comment.len() as u16)?;
    w.write_all(comment)?;
    written += (END_RECORD_SIZE + comment.len()) as u64;
    Ok(written)
}
