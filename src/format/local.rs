//! Local file headers.
//!
//! The reader trusts the central directory for names, sizes and CRCs; the
//! local header is only validated and skipped to find the entry data.

use std::io::{Cursor, Read, Seek, SeekFrom};

use super::reader::{read_u16_le, read_u32_le};
use super::{LOCAL_HEADER_SIZE, signature};
use crate::{Error, Result};

/// The parts of a local file header needed to locate entry data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalHeader {
    /// General-purpose flags.
    pub flags: u16,
    /// Compression method id.
    pub method: u16,
    /// Length of the name that follows the fixed part.
    pub name_len: u16,
    /// Length of the extra field that follows the name.
    pub extra_len: u16,
}

impl LocalHeader {
    /// Returns the absolute offset of the entry data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] if the offset does not fit in a
    /// `u64`.
    pub fn data_offset(&self, header_offset: u64) -> Result<u64> {
        let header_len =
            LOCAL_HEADER_SIZE as u64 + u64::from(self.name_len) + u64::from(self.extra_len);
        header_offset
            .checked_add(header_len)
            .ok_or_else(|| Error::CorruptHeader {
                offset: header_offset,
                reason: "entry data offset overflows".into(),
            })
    }
}

/// Reads the local header at `offset` and leaves `reader` positioned at the
/// start of the entry data.
///
/// # Errors
///
/// Returns [`Error::CorruptHeader`] if no local header signature is found at
/// the offset.
pub fn read_local_header<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<LocalHeader> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut fixed = [0u8; LOCAL_HEADER_SIZE];
    reader.read_exact(&mut fixed).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::CorruptHeader {
                offset,
                reason: "truncated local file header".into(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    let mut cursor = Cursor::new(&fixed[..]);
    if read_u32_le(&mut cursor)? != signature::LOCAL_FILE_HEADER {
        return Err(Error::CorruptHeader {
            offset,
            reason: "missing local file header signature".into(),
        });
    }
    let _version_needed = read_u16_le(&mut cursor)?;
    let flags = read_u16_le(&mut cursor)?;
    let method = read_u16_le(&mut cursor)?;
    // time, date, crc, sizes: the central directory is authoritative
    cursor.set_position(26);
    let name_len = read_u16_le(&mut cursor)?;
    let extra_len = read_u16_le(&mut cursor)?;

    let header = LocalHeader {
        flags,
        method,
        name_len,
        extra_len,
    };
    reader.seek(SeekFrom::Start(header.data_offset(offset)?))?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::reader::{write_u16_le, write_u32_le};

    fn header_bytes(name: &[u8], extra: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, signature::LOCAL_FILE_HEADER).unwrap();
        write_u16_le(&mut buf, 20).unwrap();
        write_u16_le(&mut buf, 0x0808).unwrap();
        write_u16_le(&mut buf, 8).unwrap();
        buf.extend_from_slice(&[0u8; 16]);
        write_u16_le(&mut buf, name.len() as u16).unwrap();
        write_u16_le(&mut buf, extra.len() as u16).unwrap();
        buf.extend_from_slice(name);
        buf.extend_from_slice(extra);
        buf
    }

    #[test]
    fn test_read_local_header() {
        let mut data = vec![0xAAu8; 5];
        data.extend(header_bytes(b"a.txt", &[1, 2, 3]));
        data.extend_from_slice(b"DATA");

        let mut cursor = Cursor::new(data);
        let header = read_local_header(&mut cursor, 5).unwrap();
        assert_eq!(header.flags, 0x0808);
        assert_eq!(header.method, 8);
        assert_eq!(header.data_offset(5).unwrap(), 5 + 30 + 5 + 3);

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"DATA");
    }

    #[test]
    fn test_data_offset_overflow() {
        let header = LocalHeader {
            flags: 0,
            method: 0,
            name_len: 4,
            extra_len: 0,
        };
        let err = header.data_offset(u64::MAX - 20).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_bad_signature() {
        let mut cursor = Cursor::new(vec![0u8; 64]);
        let err = read_local_header(&mut cursor, 4).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 4, .. }));
    }

    #[test]
    fn test_truncated() {
        let mut cursor = Cursor::new(vec![0x50, 0x4b, 0x03, 0x04]);
        let err = read_local_header(&mut cursor, 0).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }
}
