//! Extra field blocks.
//!
//! The extra field is a sequence of `(header id: u16, length: u16, data)`
//! blocks. Only the ZIP64 block (id `0x0001`) is interpreted. Timestamp
//! blocks are dropped when an entry's time is reset; every other block is
//! carried through untouched.

use std::io::Cursor;

use super::reader::{read_u32_le, read_u64_le};

/// Header id of the ZIP64 extended information block.
pub const ZIP64_HEADER_ID: u16 = 0x0001;

/// Header id of the Info-ZIP extended timestamp block (`UT`).
pub const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

/// Header id of the NTFS block carrying file times.
pub const NTFS_HEADER_ID: u16 = 0x000A;

/// Iterator over the blocks of an extra field.
///
/// A truncated trailing block ends iteration.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    rest: &'a [u8],
}

/// Returns an iterator over `(header id, data)` pairs.
pub fn blocks(extra: &[u8]) -> Blocks<'_> {
    Blocks { rest: extra }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest;
        if rest.len() < 4 {
            return None;
        }
        let id = u16::from_le_bytes([rest[0], rest[1]]);
        let len = usize::from(u16::from_le_bytes([rest[2], rest[3]]));
        let data = rest.get(4..4 + len)?;
        self.rest = &rest[4 + len..];
        Some((id, data))
    }
}

/// Returns the data of the first block with the given id.
pub fn find(extra: &[u8], id: u16) -> Option<&[u8]> {
    blocks(extra).find(|&(block_id, _)| block_id == id).map(|(_, data)| data)
}

/// Returns the extra field without blocks of the given id.
pub fn strip(extra: &[u8], id: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(extra.len());
    for (block_id, data) in blocks(extra) {
        if block_id != id {
            out.extend_from_slice(&block_id.to_le_bytes());
            out.extend_from_slice(&(data.len() as u16).to_le_bytes());
            out.extend_from_slice(data);
        }
    }
    out
}

/// Returns the extra field without the blocks that carry file times.
///
/// Readers take these over the header's DOS time.
pub fn strip_timestamps(extra: &[u8]) -> Vec<u8> {
    strip(&strip(extra, EXTENDED_TIMESTAMP_ID), NTFS_HEADER_ID)
}

/// Values a ZIP64 block may carry, in their mandated order.
///
/// Each field is present in the block only when the corresponding classic
/// header field holds the overflow marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Fields {
    /// Uncompressed size.
    pub size: Option<u64>,
    /// Compressed size.
    pub compressed_size: Option<u64>,
    /// Offset of the local header.
    pub local_header_offset: Option<u64>,
    /// Disk number where the entry starts.
    pub disk: Option<u32>,
}

/// Which classic fields overflowed and must be read from the ZIP64 block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zip64Needs {
    /// Uncompressed size field held `0xFFFFFFFF`.
    pub size: bool,
    /// Compressed size field held `0xFFFFFFFF`.
    pub compressed_size: bool,
    /// Local header offset field held `0xFFFFFFFF`.
    pub local_header_offset: bool,
    /// Disk number field held `0xFFFF`.
    pub disk: bool,
}

impl Zip64Needs {
    /// Returns true if no field overflowed.
    pub fn is_empty(&self) -> bool {
        !(self.size || self.compressed_size || self.local_header_offset || self.disk)
    }
}

/// Parses a ZIP64 block, reading only the fields listed in `needs`.
///
/// Returns `None` if the block is too short for the requested fields.
pub fn parse_zip64(data: &[u8], needs: Zip64Needs) -> Option<Zip64Fields> {
    let mut cursor = Cursor::new(data);
    let mut fields = Zip64Fields::default();
    if needs.size {
        fields.size = Some(read_u64_le(&mut cursor).ok()?);
    }
    if needs.compressed_size {
        fields.compressed_size = Some(read_u64_le(&mut cursor).ok()?);
    }
    if needs.local_header_offset {
        fields.local_header_offset = Some(read_u64_le(&mut cursor).ok()?);
    }
    if needs.disk {
        fields.disk = Some(read_u32_le(&mut cursor).ok()?);
    }
    Some(fields)
}

/// Builds a complete ZIP64 block (header included) from the given values.
pub fn zip64_block(values: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + values.len() * 8);
    out.extend_from_slice(&ZIP64_HEADER_ID.to_le_bytes());
    out.extend_from_slice(&((values.len() * 8) as u16).to_le_bytes());
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}
