//! Opening entry data streams.

use std::io::{Read, Seek};

use crate::codec::build_decoder;
use crate::format::local::read_local_header;
use crate::{Error, Result};

use super::{Archive, EntryReader};

/// Upper bound on the up-front allocation of [`Archive::read_to_vec`].
const MAX_PREALLOCATION: u64 = 1 << 20;

impl<R: Read + Seek> Archive<R> {
    /// Opens the data of the entry at `index` for reading.
    ///
    /// The returned reader borrows the archive; only one entry can be open
    /// at a time.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if the index is out of range
    /// - [`Error::UnsupportedFeature`] for encrypted entries
    /// - [`Error::UnsupportedMethod`] if the method cannot be decoded
    /// - [`Error::CorruptHeader`] if the local header is missing
    pub fn entry_reader(&mut self, index: usize) -> Result<EntryReader<'_>> {
        let entry = self.entries.get(index).ok_or_else(|| Error::EntryNotFound {
            path: format!("#{}", index),
        })?;
        if entry.is_encrypted() {
            return Err(Error::UnsupportedFeature {
                feature: "encrypted entries",
            });
        }
        let method = entry.method();
        if !method.is_readable() {
            return Err(Error::UnsupportedMethod {
                method: method.id(),
            });
        }

        read_local_header(&mut self.reader, entry.local_header_offset)?;
        let decoder = build_decoder(method, &mut self.reader, entry.compressed_size())?;
        Ok(EntryReader::new(decoder, &entry.record))
    }

    /// Reads the whole content of the named entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no entry has this name, or any
    /// error from [`entry_reader`](Self::entry_reader).
    pub fn read_to_vec(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self.index_of(name).ok_or_else(|| Error::EntryNotFound {
            path: name.to_string(),
        })?;
        let capacity = self.entries[index].size().min(MAX_PREALLOCATION) as usize;
        let mut data = Vec::with_capacity(capacity);
        self.entry_reader(index)?.read_to_end(&mut data)?;
        Ok(data)
    }
}
