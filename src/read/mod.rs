//! Archive reading API for ZIP archives.
//!
//! An [`Archive`] parses the central directory once when opened and then
//! opens entry streams lazily, by index, using random access into the
//! underlying reader.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::io::Read;
//! use zipmerge::Archive;
//!
//! let mut archive = Archive::open_path("archive.zip")?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name(), entry.size());
//! }
//!
//! let mut text = String::new();
//! archive.entry_reader(0)?.read_to_string(&mut text)?;
//! # Ok::<(), zipmerge::Error>(())
//! ```

mod archive_open;
mod archive_query;
mod decompression;
mod entry;

pub use entry::{Entry, EntryReader};

use std::collections::HashMap;

use crate::encoding::NameEncoding;

/// A ZIP archive reader.
pub struct Archive<R> {
    pub(crate) reader: R,
    pub(crate) entries: Vec<Entry>,
    /// First occurrence of each name.
    pub(crate) index: HashMap<String, usize>,
    pub(crate) comment: Option<String>,
    pub(crate) encoding: NameEncoding,
    /// Bytes preceding the ZIP data (non-zero for SFX archives).
    pub(crate) base_offset: u64,
}

impl<R> std::fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.entries.len())
            .field("encoding", &self.encoding)
            .field("base_offset", &self.base_offset)
            .finish_non_exhaustive()
    }
}
