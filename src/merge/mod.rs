//! Archive merging.
//!
//! A [`MergeConfig`] describes one mutation of an archive: where entries
//! come from, which are removed, renamed or transformed, and where the
//! result goes. It is built with [`MergeBuilder`] and can be run any number
//! of times.
//!
//! Entries are visited in two passes. Added sources come first, in the
//! order they were added; then the entries of the existing archive, in
//! central directory order, minus removed paths. The first entry reaching
//! an output name wins; later ones are skipped. Explicit adds therefore
//! always beat existing entries, and removal never hides an add.
//!
//! # Example
//!
//! ```rust
//! use std::io::Read;
//! use zipmerge::source::BytesSource;
//! use zipmerge::{ArchivePath, Flow, MergeBuilder};
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("out.zip");
//!
//! MergeBuilder::new()
//!     .add(BytesSource::new(ArchivePath::new("a.txt")?, b"first".to_vec()))
//!     .add(BytesSource::new(ArchivePath::new("a.txt")?, b"second".to_vec()))
//!     .destination(&path)
//!     .build()?
//!     .process()?;
//!
//! let mut seen = Vec::new();
//! MergeBuilder::from_archive(&path).build()?.iterate(|record, content| {
//!     let mut text = String::new();
//!     content.read_to_string(&mut text)?;
//!     seen.push((record.name.clone(), text));
//!     Ok(Flow::Continue)
//! })?;
//! assert_eq!(seen, vec![("a.txt".to_string(), "first".to_string())]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod commit;
mod config;
mod plan;
mod process;

pub use config::{MergeBuilder, MergeConfig};
pub use plan::Flow;
pub use process::MergeResult;
