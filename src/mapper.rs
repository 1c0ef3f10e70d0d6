//! Entry name mapping.
//!
//! A [`NameMapper`] renames entries or filters them out. It is applied to
//! added and existing entries alike; returning `None` excludes the entry.
//!
//! ```rust
//! use zipmerge::mapper::{NameMapper, Prefix, StripPrefix};
//!
//! assert_eq!(Prefix::new("lib").map("a.jar").as_deref(), Some("lib/a.jar"));
//! assert_eq!(StripPrefix::new("src").map("src/main.rs").as_deref(), Some("main.rs"));
//!
//! let no_class_files = |name: &str| (!name.ends_with(".class")).then(|| name.to_string());
//! assert_eq!(no_class_files.map("A.class"), None);
//! ```

/// Maps an entry name to its output name, or `None` to exclude the entry.
pub trait NameMapper: Send + Sync {
    /// Returns the output name for `name`.
    fn map(&self, name: &str) -> Option<String>;
}

impl<F> NameMapper for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn map(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Moves every entry under a directory.
#[derive(Debug, Clone)]
pub struct Prefix {
    dir: String,
}

impl Prefix {
    /// Creates a mapper prepending `dir`; a trailing `/` is added if missing.
    pub fn new(dir: &str) -> Self {
        let dir = dir.trim_matches('/');
        Self {
            dir: if dir.is_empty() {
                String::new()
            } else {
                format!("{}/", dir)
            },
        }
    }
}

impl NameMapper for Prefix {
    fn map(&self, name: &str) -> Option<String> {
        Some(format!("{}{}", self.dir, name))
    }
}

/// Removes a leading directory.
///
/// Entries outside the directory pass through unchanged; the directory
/// entry itself is excluded.
#[derive(Debug, Clone)]
pub struct StripPrefix {
    dir: String,
}

impl StripPrefix {
    /// Creates a mapper removing `dir`; a trailing `/` is added if missing.
    pub fn new(dir: &str) -> Self {
        Self {
            dir: format!("{}/", dir.trim_matches('/')),
        }
    }
}

impl NameMapper for StripPrefix {
    fn map(&self, name: &str) -> Option<String> {
        match name.strip_prefix(&self.dir) {
            Some("") => None,
            Some(rest) => Some(rest.to_string()),
            None => Some(name.to_string()),
        }
    }
}
