//! Merge configuration and its builder.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::encoding::NameEncoding;
use crate::mapper::NameMapper;
use crate::read::Archive;
use crate::source::{EntrySource, FileSource};
use crate::transform::{EntryTransformer, TransformerRegistry};
use crate::tree::FileTreeLister;
use crate::write::WriteOptions;
use crate::{ArchivePath, Error, Result};

/// Builder for [`MergeConfig`].
///
/// ```rust
/// use zipmerge::mapper::Prefix;
/// use zipmerge::{MergeBuilder, NameEncoding};
///
/// let config = MergeBuilder::from_archive("in.zip")
///     .destination("out.zip")
///     .remove("tmp/")
///     .name_mapper(Prefix::new("v2"))
///     .encoding(NameEncoding::for_label("cp866").unwrap())
///     .build()?;
/// assert!(!config.is_in_place());
/// # Ok::<(), zipmerge::Error>(())
/// ```
#[must_use = "builders do nothing until `build` is called"]
pub struct MergeBuilder {
    config: MergeConfig,
}

impl MergeBuilder {
    /// Starts a configuration that builds a new archive from added entries
    /// only. A [`destination`](Self::destination) is required.
    pub fn new() -> Self {
        Self {
            config: MergeConfig {
                source: None,
                destination: None,
                encoding: NameEncoding::default(),
                preserve_timestamps: false,
                write_options: WriteOptions::default(),
                added: Vec::new(),
                removed: Vec::new(),
                transformers: TransformerRegistry::new(),
                mapper: None,
            },
        }
    }

    /// Starts a configuration that mutates the archive at `path`.
    ///
    /// Without a [`destination`](Self::destination) the archive is replaced
    /// in place.
    pub fn from_archive(path: impl Into<PathBuf>) -> Self {
        let mut builder = Self::new();
        builder.config.source = Some(path.into());
        builder
    }

    /// Adds an entry. Earlier adds win over later ones with the same
    /// output name.
    pub fn add(mut self, source: impl EntrySource + 'static) -> Self {
        self.config.added.push(Box::new(source));
        self
    }

    /// Adds several entries in order.
    pub fn add_all<S, I>(mut self, sources: I) -> Self
    where
        S: EntrySource + 'static,
        I: IntoIterator<Item = S>,
    {
        for source in sources {
            self.config.added.push(Box::new(source));
        }
        self
    }

    /// Adds a file, or every file under a directory.
    ///
    /// A file becomes one entry named after it. A directory is listed
    /// recursively; entry names are relative to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be read or listed.
    #[cfg(feature = "tree")]
    pub fn add_file(self, path: impl AsRef<Path>) -> Result<Self> {
        self.add_file_with(path, false, |_: &Path| true)
    }

    /// Adds a file, or the files under a directory accepted by `filter`.
    ///
    /// With `preserve_root` the directory's own name is kept as the first
    /// segment of every entry name. The filter is not consulted for a
    /// single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be read or listed.
    #[cfg(feature = "tree")]
    pub fn add_file_with(
        self,
        path: impl AsRef<Path>,
        preserve_root: bool,
        filter: impl Fn(&Path) -> bool,
    ) -> Result<Self> {
        self.add_tree_with(&crate::tree::WalkDirLister::new(), path, preserve_root, filter)
    }

    /// Like [`add_file_with`](Self::add_file_with) with a custom lister.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be read or `lister` fails.
    pub fn add_tree_with(
        mut self,
        lister: &dyn FileTreeLister,
        path: impl AsRef<Path>,
        preserve_root: bool,
        filter: impl Fn(&Path) -> bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !std::fs::metadata(path)?.is_dir() {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::InvalidArchivePath(path.display().to_string()))?;
            self.config
                .added
                .push(Box::new(FileSource::new(ArchivePath::new(name)?, path)));
            return Ok(self);
        }

        for entry in lister.list(path, &filter, preserve_root)? {
            self.config
                .added
                .push(Box::new(FileSource::new(entry.name, entry.path)));
        }
        Ok(self)
    }

    /// Removes an existing entry.
    ///
    /// A path ending in `/`, or naming a directory entry of the archive,
    /// removes everything beneath it as well. Removal never affects
    /// added entries.
    pub fn remove(mut self, path: impl Into<String>) -> Self {
        self.config.removed.push(path.into());
        self
    }

    /// Removes several existing entries.
    pub fn remove_all<P, I>(mut self, paths: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = P>,
    {
        self.config.removed.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Registers a transformer for the entry whose output name is `path`.
    ///
    /// A later registration for the same path replaces the earlier one.
    pub fn transformer(
        mut self,
        path: impl Into<String>,
        transformer: impl EntryTransformer + 'static,
    ) -> Self {
        self.config.transformers.register(path, transformer);
        self
    }

    /// Sets the name mapper applied to every entry.
    pub fn name_mapper(mut self, mapper: impl NameMapper + 'static) -> Self {
        self.config.mapper = Some(Box::new(mapper));
        self
    }

    /// Keeps the modification times of copied entries instead of setting
    /// them to the current time.
    pub fn preserve_timestamps(mut self, preserve: bool) -> Self {
        self.config.preserve_timestamps = preserve;
        self
    }

    /// Sets the charset used for names that are not flagged as UTF-8, on
    /// both the read and the write side.
    pub fn encoding(mut self, encoding: NameEncoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    /// Sets the options of the output writer.
    pub fn write_options(mut self, options: WriteOptions) -> Self {
        self.config.write_options = options;
        self
    }

    /// Sets the output path.
    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.destination = Some(path.into());
        self
    }

    /// Finishes the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if neither a source archive
    /// nor a destination is set.
    pub fn build(self) -> Result<MergeConfig> {
        if self.config.source.is_none() && self.config.destination.is_none() {
            return Err(Error::InvalidConfiguration(
                "a source archive or a destination is required".into(),
            ));
        }
        Ok(self.config)
    }
}

impl Default for MergeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MergeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MergeBuilder").field(&self.config).finish()
    }
}

/// An immutable merge configuration.
///
/// Every run ([`process`](Self::process), [`iterate`](Self::iterate),
/// [`iterate_info`](Self::iterate_info)) starts from fresh state, so a
/// configuration can be run repeatedly.
pub struct MergeConfig {
    pub(crate) source: Option<PathBuf>,
    pub(crate) destination: Option<PathBuf>,
    pub(crate) encoding: NameEncoding,
    pub(crate) preserve_timestamps: bool,
    pub(crate) write_options: WriteOptions,
    pub(crate) added: Vec<Box<dyn EntrySource>>,
    pub(crate) removed: Vec<String>,
    pub(crate) transformers: TransformerRegistry,
    pub(crate) mapper: Option<Box<dyn NameMapper>>,
}

impl MergeConfig {
    /// Returns the source archive path.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Returns the destination path.
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Returns true if the run replaces the source archive.
    ///
    /// A destination resolving to the source file counts as in place.
    pub fn is_in_place(&self) -> bool {
        match (&self.source, &self.destination) {
            (Some(_), None) => true,
            (Some(src), Some(dst)) => super::commit::same_file(src, dst),
            _ => false,
        }
    }

    /// Applies the name mapper.
    pub(crate) fn map_name(&self, name: &str) -> Option<String> {
        match &self.mapper {
            Some(mapper) => mapper.map(name),
            None => Some(name.to_string()),
        }
    }

    /// Opens the source archive, if any.
    pub(crate) fn open_source(&self) -> Result<Option<Archive<BufReader<File>>>> {
        self.source
            .as_ref()
            .map(|path| Archive::open_path_with_encoding(path, self.encoding))
            .transpose()
    }
}

impl fmt::Debug for MergeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeConfig")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("encoding", &self.encoding)
            .field("preserve_timestamps", &self.preserve_timestamps)
            .field("write_options", &self.write_options)
            .field("added", &self.added.len())
            .field("removed", &self.removed)
            .field("transformers", &self.transformers)
            .field("mapper", &self.mapper.is_some())
            .finish()
    }
}
