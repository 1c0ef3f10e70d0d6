//! ZIP record layouts, constants and low-level parsing utilities.
//!
//! An archive is a sequence of local file headers, each followed by the
//! entry data (and an optional data descriptor), then the central directory
//! and the end of central directory record. ZIP64 adds a second end record
//! plus a locator when sizes, offsets or counts overflow the classic fields.

pub mod central;
pub mod extra;
pub mod local;
pub mod reader;

/// Record signatures (little-endian `u32` values).
pub mod signature {
    /// Local file header: `PK\x03\x04`.
    pub const LOCAL_FILE_HEADER: u32 = 0x0403_4b50;
    /// Central directory file header: `PK\x01\x02`.
    pub const CENTRAL_DIRECTORY: u32 = 0x0201_4b50;
    /// End of central directory: `PK\x05\x06`.
    pub const END_OF_CENTRAL_DIRECTORY: u32 = 0x0605_4b50;
    /// ZIP64 end of central directory: `PK\x06\x06`.
    pub const ZIP64_END_OF_CENTRAL_DIRECTORY: u32 = 0x0606_4b50;
    /// ZIP64 end of central directory locator: `PK\x06\x07`.
    pub const ZIP64_END_LOCATOR: u32 = 0x0706_4b50;
    /// Optional data descriptor signature: `PK\x07\x08`.
    pub const DATA_DESCRIPTOR: u32 = 0x0807_4b50;
}

/// General-purpose bit flags.
pub mod flags {
    /// Entry data is encrypted.
    pub const ENCRYPTED: u16 = 1 << 0;
    /// CRC and sizes follow the data in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
    /// Strong encryption.
    pub const STRONG_ENCRYPTION: u16 = 1 << 6;
    /// Name and comment are UTF-8.
    pub const UTF8: u16 = 1 << 11;
}

/// "Version needed to extract" values.
pub mod version {
    /// Deflate, directories and data descriptors.
    pub const DEFAULT: u16 = 20;
    /// ZIP64 records.
    pub const ZIP64: u16 = 45;
}

/// MS-DOS directory attribute, stored in the low byte of external attributes.
pub const DOS_DIRECTORY_ATTRIBUTE: u32 = 0x10;

/// Fixed part of a local file header.
pub const LOCAL_HEADER_SIZE: usize = 30;

/// Fixed part of a central directory header.
pub const CENTRAL_HEADER_SIZE: usize = 46;

/// End of central directory record without the comment.
pub const END_RECORD_SIZE: usize = 22;

/// ZIP64 end of central directory record without extensible data.
pub const ZIP64_END_RECORD_SIZE: usize = 56;

/// ZIP64 end of central directory locator.
pub const ZIP64_LOCATOR_SIZE: usize = 20;

/// Largest archive or entry comment.
pub const MAX_COMMENT_LENGTH: usize = u16::MAX as usize;

/// Sentinel stored in 32-bit fields whose value lives in a ZIP64 record.
pub const ZIP64_MARKER_32: u32 = u32::MAX;

/// Sentinel stored in 16-bit fields whose value lives in a ZIP64 record.
pub const ZIP64_MARKER_16: u16 = u16::MAX;
