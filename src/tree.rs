//! Directory tree listing for bulk adds.
//!
//! [`MergeBuilder::add_file`](crate::MergeBuilder::add_file) turns a
//! directory into one added entry per file, named relative to the
//! directory (optionally keeping the directory's own name as the first
//! segment).

use std::path::{Component, Path, PathBuf};

use crate::{ArchivePath, Error, Result};

/// One file found under a listed root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Entry name in the archive.
    pub name: ArchivePath,
    /// Path on disk.
    pub path: PathBuf,
}

/// Lists the files under a directory.
pub trait FileTreeLister {
    /// Lists the regular files under `root` accepted by `filter`.
    ///
    /// With `preserve_root` the entry names start with the name of `root`.
    fn list(
        &self,
        root: &Path,
        filter: &dyn Fn(&Path) -> bool,
        preserve_root: bool,
    ) -> Result<Vec<TreeEntry>>;
}

/// Recursive lister backed by `walkdir`, sorted by file name.
#[cfg(feature = "tree")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkDirLister {
    follow_links: bool,
}

#[cfg(feature = "tree")]
impl WalkDirLister {
    /// Creates a lister that does not follow symbolic links.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether symbolic links are followed.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

#[cfg(feature = "tree")]
impl FileTreeLister for WalkDirLister {
    fn list(
        &self,
        root: &Path,
        filter: &dyn Fn(&Path) -> bool,
        preserve_root: bool,
    ) -> Result<Vec<TreeEntry>> {
        let walker = walkdir::WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        let mut entries = Vec::new();
        for item in walker {
            let item = item.map_err(|e| Error::Io(e.into()))?;
            if !item.file_type().is_file() || !filter(item.path()) {
                continue;
            }
            let name = relative_entry_name(root, item.path(), preserve_root)?;
            entries.push(TreeEntry {
                name,
                path: item.into_path(),
            });
        }
        log::debug!("listed {} files under {}", entries.len(), root.display());
        Ok(entries)
    }
}

/// Computes the archive name of `file` relative to `root`.
///
/// With `preserve_root` the name starts with the last component of `root`.
///
/// # Errors
///
/// Returns [`Error::NotUnderRoot`] if `file` is not beneath `root`, or
/// [`Error::InvalidArchivePath`] if a component is not valid UTF-8.
pub fn relative_entry_name(root: &Path, file: &Path, preserve_root: bool) -> Result<ArchivePath> {
    let relative = file.strip_prefix(root).map_err(|_| Error::NotUnderRoot {
        path: file.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    let mut segments = Vec::new();
    if preserve_root {
        if let Some(name) = root.file_name() {
            segments.push(utf8_segment(name.to_str(), file)?);
        }
    }
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(utf8_segment(part.to_str(), file)?),
            _ => {
                return Err(Error::NotUnderRoot {
                    path: file.to_path_buf(),
                    root: root.to_path_buf(),
                });
            }
        }
    }
    if segments.is_empty() {
        return Err(Error::NotUnderRoot {
            path: file.to_path_buf(),
            root: root.to_path_buf(),
        });
    }
    ArchivePath::from_segments(segments)
}

fn utf8_segment<'a>(segment: Option<&'a str>, file: &Path) -> Result<&'a str> {
    segment.ok_or_else(|| {
        Error::InvalidArchivePath(format!("non-UTF-8 path: {}", file.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_name() {
        let name = relative_entry_name(Path::new("/data/site"), Path::new("/data/site/css/a.css"), false)
            .unwrap();
        assert_eq!(name.as_str(), "css/a.css");
    }

    #[test]
    fn test_relative_name_preserving_root() {
        let name = relative_entry_name(Path::new("/data/site"), Path::new("/data/site/index.html"), true)
            .unwrap();
        assert_eq!(name.as_str(), "site/index.html");
    }

    #[test]
    fn test_file_outside_root() {
        let err = relative_entry_name(Path::new("/data/site"), Path::new("/data/other/x"), false)
            .unwrap_err();
        assert!(matches!(err, Error::NotUnderRoot { .. }));
        assert!(relative_entry_name(Path::new("/data"), Path::new("/data"), false).is_err());
    }

    #[cfg(feature = "tree")]
    #[test]
    fn test_walkdir_lists_sorted_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("b/c")).unwrap();
        std::fs::write(dir.path().join("b/c/z.txt"), b"z").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("b/skip.tmp"), b"t").unwrap();

        let filter = |p: &Path| p.extension().is_none_or(|e| e != "tmp");
        let entries = WalkDirLister::new().list(dir.path(), &filter, false).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b/c/z.txt"]);
    }
}
