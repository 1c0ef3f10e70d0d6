//! Archive entry types.

use std::io::{self, Read};

use crate::checksum::VerifyingReader;
use crate::codec::{CompressionMethod, Decoder};
use crate::format::flags;
use crate::record::EntryRecord;
use crate::timestamp::Timestamp;

/// An entry in a ZIP archive, as listed by the central directory.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Entry {
    /// Entry metadata; sizes, CRC and method are always present.
    pub record: EntryRecord,
    /// General-purpose flags.
    pub flags: u16,
    /// External file attributes (host dependent).
    pub external_attributes: u32,
    /// Index in central directory order.
    pub index: usize,
    /// Absolute offset of the local header.
    pub(crate) local_header_offset: u64,
}

impl Entry {
    /// Returns the full entry name.
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Returns true if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.record.is_directory()
    }

    /// Returns true if this is a file (not a directory).
    pub fn is_file(&self) -> bool {
        !self.is_directory()
    }

    /// Returns true if the entry data is encrypted.
    ///
    /// Encrypted entries are listed but cannot be opened.
    pub fn is_encrypted(&self) -> bool {
        self.flags & (flags::ENCRYPTED | flags::STRONG_ENCRYPTION) != 0
    }

    /// Returns the compression method.
    pub fn method(&self) -> CompressionMethod {
        self.record.method.unwrap_or(CompressionMethod::Stored)
    }

    /// Returns the uncompressed size.
    pub fn size(&self) -> u64 {
        self.record.size.unwrap_or(0)
    }

    /// Returns the compressed size.
    pub fn compressed_size(&self) -> u64 {
        self.record.compressed_size.unwrap_or(0)
    }

    /// Returns the modification time, if the stored DOS fields are valid.
    pub fn modified(&self) -> Option<Timestamp> {
        self.record.mod_time
    }
}

/// A stream over one entry's uncompressed data.
///
/// Size and CRC-32 are checked against the central directory when the end
/// of the stream is reached.
pub struct EntryReader<'a> {
    inner: VerifyingReader<Box<dyn Decoder + 'a>>,
}

impl<'a> EntryReader<'a> {
    pub(crate) fn new(decoder: Box<dyn Decoder + 'a>, record: &EntryRecord) -> Self {
        Self {
            inner: VerifyingReader::new(decoder, record.name.clone(), record.crc32, record.size),
        }
    }
}

impl std::fmt::Debug for EntryReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryReader").finish_non_exhaustive()
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, flags: u16) -> Entry {
        Entry {
            record: EntryRecord::new(name)
                .with_size(3)
                .with_method(CompressionMethod::Deflated),
            flags,
            external_attributes: 0,
            index: 0,
            local_header_offset: 0,
        }
    }

    #[test]
    fn test_entry_accessors() {
        let e = entry("dir/file.txt", 0);
        assert_eq!(e.name(), "dir/file.txt");
        assert!(e.is_file());
        assert!(!e.is_encrypted());
        assert_eq!(e.method(), CompressionMethod::Deflated);
        assert_eq!(e.size(), 3);
        assert_eq!(e.compressed_size(), 0);
    }

    #[test]
    fn test_encrypted_flag() {
        assert!(entry("secret.bin", flags::ENCRYPTED).is_encrypted());
    }
}
