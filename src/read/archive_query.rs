//! Archive query methods.
//!
//! These only consult the parsed central directory; no entry data is read.

use super::{Archive, Entry};
use crate::encoding::NameEncoding;

impl<R> Archive<R> {
    /// Returns all entries in central directory order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the archive comment, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the number of entries in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the index of the first entry with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns true if an entry with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Finds an entry by name.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.index_of(name).map(|i| &self.entries[i])
    }

    /// Returns the encoding used for names without the UTF-8 flag.
    pub fn encoding(&self) -> NameEncoding {
        self.encoding
    }

    /// Returns the number of bytes preceding the ZIP data.
    pub fn prefix_len(&self) -> u64 {
        self.base_offset
    }

    /// Consumes the archive and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
