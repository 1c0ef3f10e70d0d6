//! # zipmerge
//!
//! A streaming ZIP mutation engine.
//!
//! Given an existing archive (optional), entries to add or replace, paths
//! to remove, an optional renaming function and per-entry content
//! transformers, zipmerge produces a new archive holding exactly one entry
//! per output name. Content is streamed entry by entry; whole archives are
//! never held in memory. When the destination is the source archive itself,
//! the result replaces it atomically or not at all.
//!
//! ## Quick Start
//!
//! ### Updating an Archive In Place
//!
//! ```rust,no_run
//! use zipmerge::source::BytesSource;
//! use zipmerge::{ArchivePath, MergeBuilder, Result};
//!
//! fn main() -> Result<()> {
//!     let config = MergeBuilder::from_archive("app.jar")
//!         .add(BytesSource::new(ArchivePath::new("META-INF/build.txt")?, b"42".to_vec()))
//!         .remove("debug/")
//!         .preserve_timestamps(true)
//!         .build()?;
//!
//!     let result = config.process()?;
//!     println!("{} entries written", result.entries_written);
//!     Ok(())
//! }
//! ```
//!
//! ### Creating an Archive From a Directory
//!
//! ```rust,no_run
//! use zipmerge::{MergeBuilder, Result};
//!
//! fn main() -> Result<()> {
//!     MergeBuilder::new()
//!         .add_file("site")?
//!         .destination("site.zip")
//!         .build()?
//!         .process()?;
//!     Ok(())
//! }
//! ```
//!
//! ### Listing Entries
//!
//! ```rust,no_run
//! use zipmerge::{Flow, MergeBuilder, Result};
//!
//! fn main() -> Result<()> {
//!     let config = MergeBuilder::from_archive("app.jar").build()?;
//!     config.iterate_info(|record| {
//!         println!("{} ({:?} bytes)", record.name, record.size);
//!         Ok(Flow::Continue)
//!     })?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `deflate` (default): read and write Deflate-compressed entries
//! - `tree` (default): recursive directory adds through `walkdir`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod checksum;
pub mod codec;
pub mod encoding;
pub mod error;
pub mod format;
pub mod mapper;
pub mod merge;
pub mod read;
pub mod record;
pub mod source;
pub mod timestamp;
pub mod transform;
pub mod tree;
pub mod write;

pub use archive_path::ArchivePath;
pub use codec::CompressionMethod;
pub use encoding::NameEncoding;
pub use error::{Error, Result};
pub use record::EntryRecord;
pub use timestamp::Timestamp;

// Re-export reading API at crate root for convenience
pub use read::{Archive, Entry, EntryReader};

// Re-export writing API at crate root for convenience
pub use write::{EntrySink, WriteOptions, WriteResult, Writer};

// Re-export merge API
pub use merge::{Flow, MergeBuilder, MergeConfig, MergeResult};

pub use mapper::NameMapper;
pub use source::EntrySource;
pub use transform::EntryTransformer;

#[cfg(feature = "tree")]
pub use tree::WalkDirLister;
pub use tree::{FileTreeLister, TreeEntry};
