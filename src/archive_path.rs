//! Archive path type with validation for caller-supplied entry names.
//!
//! Names read from an existing archive are kept verbatim as strings; only
//! names that callers introduce (added sources, directory listings) go
//! through [`ArchivePath`].

use crate::{Error, Result};
use std::fmt;

/// Maximum length for archive paths (in bytes).
///
/// The ZIP local and central headers store the name length in 16 bits.
const MAX_PATH_LENGTH: usize = u16::MAX as usize;

/// A validated ZIP entry name.
///
/// `ArchivePath` validates that:
/// - No NUL bytes or backslashes are present
/// - The path is not absolute (does not start with `/`)
/// - No empty segments exist (no `//`); a single trailing `/` is allowed and
///   marks a directory entry
/// - No `.` or `..` segments are present
///
/// # Examples
///
/// ```
/// use zipmerge::ArchivePath;
///
/// let path = ArchivePath::new("dir/file.txt").unwrap();
/// assert_eq!(path.as_str(), "dir/file.txt");
///
/// let dir = ArchivePath::new("dir/").unwrap();
/// assert!(dir.is_directory());
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the path:
    /// - Contains NUL bytes or backslashes
    /// - Is an absolute path (starts with `/`)
    /// - Contains empty segments (e.g., `a//b`)
    /// - Contains `.` or `..` segments
    /// - Is empty or longer than 65535 bytes
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Validates an archive path string.
    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        if s.contains('\\') {
            return Err(Error::InvalidArchivePath(
                "backslash not allowed, use '/' as separator".into(),
            ));
        }

        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }

        let body = s.strip_suffix('/').unwrap_or(s);
        for segment in body.split('/') {
            if segment.is_empty() {
                return Err(Error::InvalidArchivePath(
                    "empty segment (consecutive slashes)".into(),
                ));
            }
            if segment == "." {
                return Err(Error::InvalidArchivePath("'.' segment not allowed".into()));
            }
            if segment == ".." {
                return Err(Error::InvalidArchivePath(
                    "'..' segment not allowed (path traversal)".into(),
                ));
            }
        }

        Ok(())
    }

    /// Builds a path from already split segments, joined with `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined path is invalid.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let joined = segments.into_iter().collect::<Vec<_>>().join("/");
        Self::new(&joined)
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the path and returns the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns true if this path names a directory entry (trailing `/`).
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns this path as a directory entry name, appending `/` if needed.
    pub fn to_directory(&self) -> Self {
        if self.is_directory() {
            self.clone()
        } else {
            Self(format!("{}/", self.0))
        }
    }

    /// Joins this path with another segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting path would be invalid.
    pub fn join(&self, other: &str) -> Result<Self> {
        let base = self.0.strip_suffix('/').unwrap_or(&self.0);
        Self::new(&format!("{}/{}", base, other))
    }

    /// Returns the parent directory of this path, if any.
    ///
    /// The parent is returned in directory form (with a trailing `/`).
    pub fn parent(&self) -> Option<Self> {
        let body = self.0.strip_suffix('/').unwrap_or(&self.0);
        body.rfind('/').map(|idx| Self(body[..=idx].to_string()))
    }

    /// Returns the file name (last segment) of this path.
    pub fn file_name(&self) -> &str {
        let body = self.0.strip_suffix('/').unwrap_or(&self.0);
        body.rsplit('/').next().unwrap_or(body)
    }

    /// Returns an iterator over the path components (segments).
    ///
    /// ```
    /// use zipmerge::ArchivePath;
    ///
    /// let path = ArchivePath::new("a/b/c.txt").unwrap();
    /// let components: Vec<_> = path.components().collect();
    /// assert_eq!(components, vec!["a", "b", "c.txt"]);
    /// ```
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.strip_suffix('/').unwrap_or(&self.0).split('/')
    }

    /// Returns true if this path starts with the given prefix.
    ///
    /// This performs a component-wise comparison, not a string prefix match.
    /// For example, `"foo/bar"` starts with `"foo"` but not `"fo"`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
        if prefix.is_empty() {
            return true;
        }
        let mut ours = self.components();
        prefix.split('/').all(|p| ours.next() == Some(p))
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ArchivePath> for String {
    fn from(path: ArchivePath) -> Self {
        path.0
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}
