//! Per-entry content transformers.
//!
//! A transformer replaces the plain copy of one entry. It receives the
//! entry content and record and writes whatever it wants to the output:
//! one rewritten entry, several entries, or none.
//!
//! # Example
//!
//! ```rust
//! use zipmerge::transform::{StringTransformer, TransformerRegistry};
//!
//! let mut registry = TransformerRegistry::new();
//! registry.register("VERSION", StringTransformer::new(|text| Ok(text.trim().to_string() + "-patched")));
//! assert!(registry.contains("VERSION"));
//!
//! let transformer = registry.take("VERSION");
//! assert!(transformer.is_some());
//! assert!(registry.take("VERSION").is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::checksum::{Checksum, Crc32};
use crate::record::EntryRecord;
use crate::write::EntrySink;
use crate::Result;

/// Rewrites one entry.
///
/// The transformer must consume `input` and is responsible for every entry
/// it writes to `out`, starting and finishing each of them.
pub trait EntryTransformer: Send + Sync {
    /// Transforms the entry described by `record`.
    fn transform(
        &self,
        input: &mut dyn Read,
        record: &EntryRecord,
        out: &mut dyn EntrySink,
    ) -> Result<()>;
}

impl<F> EntryTransformer for F
where
    F: Fn(&mut dyn Read, &EntryRecord, &mut dyn EntrySink) -> Result<()> + Send + Sync,
{
    fn transform(
        &self,
        input: &mut dyn Read,
        record: &EntryRecord,
        out: &mut dyn EntrySink,
    ) -> Result<()> {
        self(input, record, out)
    }
}

/// Rewrites the content stream into one entry of the same name.
pub struct StreamTransformer<F> {
    f: F,
}

impl<F> StreamTransformer<F>
where
    F: Fn(&mut dyn Read, &mut dyn Write) -> Result<()> + Send + Sync,
{
    /// Creates a transformer copying `input` to the output through `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EntryTransformer for StreamTransformer<F>
where
    F: Fn(&mut dyn Read, &mut dyn Write) -> Result<()> + Send + Sync,
{
    fn transform(
        &self,
        input: &mut dyn Read,
        record: &EntryRecord,
        mut out: &mut dyn EntrySink,
    ) -> Result<()> {
        out.start_entry(&record.content_rewritten())?;
        (self.f)(input, &mut out)?;
        out.finish_entry()
    }
}

/// Rewrites the whole content in memory.
pub struct BytesTransformer<F> {
    f: F,
}

impl<F> BytesTransformer<F>
where
    F: Fn(Vec<u8>) -> Result<Vec<u8>> + Send + Sync,
{
    /// Creates a transformer applying `f` to the full content.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EntryTransformer for BytesTransformer<F>
where
    F: Fn(Vec<u8>) -> Result<Vec<u8>> + Send + Sync,
{
    fn transform(
        &self,
        input: &mut dyn Read,
        record: &EntryRecord,
        out: &mut dyn EntrySink,
    ) -> Result<()> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        let data = (self.f)(data)?;
        write_whole(out, record, &data)
    }
}

/// Rewrites UTF-8 text content.
///
/// Content that is not valid UTF-8 fails with an I/O error of kind
/// `InvalidData`.
pub struct StringTransformer<F> {
    f: F,
}

impl<F> StringTransformer<F>
where
    F: Fn(String) -> Result<String> + Send + Sync,
{
    /// Creates a transformer applying `f` to the content as text.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EntryTransformer for StringTransformer<F>
where
    F: Fn(String) -> Result<String> + Send + Sync,
{
    fn transform(
        &self,
        input: &mut dyn Read,
        record: &EntryRecord,
        out: &mut dyn EntrySink,
    ) -> Result<()> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        let text = (self.f)(text)?;
        write_whole(out, record, text.as_bytes())
    }
}

fn write_whole(out: &mut dyn EntrySink, record: &EntryRecord, data: &[u8]) -> Result<()> {
    let record = record
        .content_rewritten()
        .with_size(data.len() as u64)
        .with_crc32(Crc32::compute(data));
    out.start_entry(&record)?;
    out.write_all(data)?;
    out.finish_entry()
}

/// Transformers keyed by output entry name.
///
/// Registering twice for the same name keeps the later transformer. During
/// a run each transformer is [taken](Self::take) when applied, so it fires
/// at most once.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    transformers: HashMap<String, Arc<dyn EntryTransformer>>,
}

impl TransformerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `transformer` for the entry named `path`.
    pub fn register(&mut self, path: impl Into<String>, transformer: impl EntryTransformer + 'static) {
        let path = path.into();
        if self
            .transformers
            .insert(path.clone(), Arc::new(transformer))
            .is_some()
        {
            log::debug!("replacing transformer registered for {}", path);
        }
    }

    /// Removes and returns the transformer for `path`.
    pub fn take(&mut self, path: &str) -> Option<Arc<dyn EntryTransformer>> {
        self.transformers.remove(path)
    }

    /// Returns true if a transformer is registered for `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.transformers.contains_key(path)
    }

    /// Returns the number of registered transformers.
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Returns true if no transformer is registered.
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&str> = self.transformers.keys().map(String::as_str).collect();
        paths.sort_unstable();
        f.debug_struct("TransformerRegistry")
            .field("paths", &paths)
            .finish()
    }
}
