//! Entry metadata.

use crate::codec::CompressionMethod;
use crate::format::extra;
use crate::timestamp::Timestamp;

/// Metadata of one archive entry.
///
/// Records are plain values: the merge engine builds a fresh one per entry
/// and hands out references. Every field except the name is optional;
/// unknown values are filled in by the writer (CRC and sizes are computed
/// from the streamed data, the modification time defaults to now).
///
/// ```rust
/// use zipmerge::{EntryRecord, Timestamp};
///
/// let record = EntryRecord::new("docs/readme.txt")
///     .with_size(12)
///     .with_mod_time(Timestamp::from_unix_secs(1_700_000_000));
/// assert!(!record.is_directory());
/// assert_eq!(record.renamed("README").size, Some(12));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Entry name, `/`-separated; a trailing `/` marks a directory.
    pub name: String,
    /// Last modification time.
    pub mod_time: Option<Timestamp>,
    /// CRC-32 of the uncompressed data.
    pub crc32: Option<u32>,
    /// Uncompressed size in bytes.
    pub size: Option<u64>,
    /// Compressed size in bytes.
    pub compressed_size: Option<u64>,
    /// Compression method.
    pub method: Option<CompressionMethod>,
    /// Raw extra field data (header id / length blocks).
    pub extra: Option<Vec<u8>>,
    /// Entry comment.
    pub comment: Option<String>,
}

impl EntryRecord {
    /// Creates a record with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mod_time: None,
            crc32: None,
            size: None,
            compressed_size: None,
            method: None,
            extra: None,
            comment: None,
        }
    }

    /// Returns true if this record names a directory.
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Returns a copy under another name with identical metadata.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Returns the record to use for a copied output entry.
    ///
    /// The modification time is kept when `preserve_timestamps` is set and
    /// reset to the current time otherwise; a reset also drops the extended
    /// timestamp and NTFS extra blocks so readers see the new time. A method the writer cannot
    /// produce is dropped so the writer's default applies. The compressed
    /// size is dropped since it depends on the output encoding.
    pub fn copy_for_output(&self, preserve_timestamps: bool) -> Self {
        let (mod_time, extra) = if preserve_timestamps {
            (self.mod_time, self.extra.clone())
        } else {
            let extra = self
                .extra
                .as_deref()
                .map(extra::strip_timestamps)
                .filter(|e| !e.is_empty());
            (Some(Timestamp::now()), extra)
        };
        Self {
            name: self.name.clone(),
            mod_time,
            crc32: self.crc32,
            size: self.size,
            compressed_size: None,
            method: self.method.filter(|m| m.is_writable()),
            extra,
            comment: self.comment.clone(),
        }
    }

    /// Returns a copy without CRC and sizes, for content that is rewritten
    /// before it reaches the writer.
    pub fn content_rewritten(&self) -> Self {
        Self {
            crc32: None,
            size: None,
            compressed_size: None,
            ..self.clone()
        }
    }

    /// Sets the modification time.
    pub fn with_mod_time(mut self, mod_time: Timestamp) -> Self {
        self.mod_time = Some(mod_time);
        self
    }

    /// Sets the CRC-32.
    pub fn with_crc32(mut self, crc32: u32) -> Self {
        self.crc32 = Some(crc32);
        self
    }

    /// Sets the uncompressed size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the compression method.
    pub fn with_method(mut self, method: CompressionMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the raw extra field.
    pub fn with_extra(mut self, extra: Vec<u8>) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Sets the entry comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EntryRecord {
        EntryRecord::new("a/b.txt")
            .with_mod_time(Timestamp::from_unix_secs(1_000_000_000))
            .with_crc32(0xDEADBEEF)
            .with_size(10)
            .with_method(CompressionMethod::Stored)
            .with_extra(vec![1, 2, 3, 4])
            .with_comment("note")
    }

    #[test]
    fn test_directory() {
        assert!(EntryRecord::new("dir/").is_directory());
        assert!(!EntryRecord::new("dir").is_directory());
    }

    #[test]
    fn test_renamed_keeps_metadata() {
        let renamed = sample().renamed("c.txt");
        assert_eq!(renamed.name, "c.txt");
        assert_eq!(renamed.crc32, Some(0xDEADBEEF));
        assert_eq!(renamed.comment.as_deref(), Some("note"));
    }

    #[test]
    fn test_copy_preserving_timestamp() {
        let mut original = sample();
        original.compressed_size = Some(7);
        let copy = original.copy_for_output(true);
        assert_eq!(copy.mod_time, original.mod_time);
        assert_eq!(copy.extra, original.extra);
        assert_eq!(copy.compressed_size, None);
    }

    #[test]
    fn test_copy_resets_timestamp() {
        let before = Timestamp::now();
        let copy = sample().copy_for_output(false);
        assert!(copy.mod_time.unwrap() >= before);
    }

    #[test]
    fn test_copy_resetting_timestamp_drops_time_extras() {
        // UT block with a 2001 modification time, then an unrelated block
        let mut ut = vec![0x55, 0x54, 0x05, 0x00, 0x01];
        ut.extend_from_slice(&981_173_106u32.to_le_bytes());
        let mut extra = ut.clone();
        extra.extend_from_slice(&[0xCA, 0xFE, 0x02, 0x00, 0x07, 0x08]);
        let record = sample().with_extra(extra.clone());

        let reset = record.copy_for_output(false);
        assert_eq!(reset.extra, Some(vec![0xCA, 0xFE, 0x02, 0x00, 0x07, 0x08]));

        let kept = record.copy_for_output(true);
        assert_eq!(kept.extra, Some(extra));

        let only_ut = sample().with_extra(ut).copy_for_output(false);
        assert_eq!(only_ut.extra, None);
    }

    #[test]
    fn test_content_rewritten_clears_content_info() {
        let record = sample().content_rewritten();
        assert_eq!(record.crc32, None);
        assert_eq!(record.size, None);
        assert_eq!(record.comment.as_deref(), Some("note"));
    }

    #[test]
    fn test_copy_drops_unwritable_method() {
        let record = sample().with_method(CompressionMethod::Other(12));
        assert_eq!(record.copy_for_output(true).method, None);
    }
}
