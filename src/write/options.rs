//! Write options and configuration for archive creation.

use crate::codec::CompressionMethod;

/// Default compression level.
const DEFAULT_LEVEL: u32 = 6;

/// Options for creating archives.
///
/// ```rust
/// use zipmerge::CompressionMethod;
/// use zipmerge::write::WriteOptions;
///
/// let options = WriteOptions::new()
///     .method(CompressionMethod::Stored)
///     .comment("nightly build");
/// assert_eq!(options.method, CompressionMethod::Stored);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Method for entries whose record does not name a writable one.
    pub method: CompressionMethod,
    /// Deflate compression level (0-9).
    pub level: u32,
    /// Archive comment written into the end record.
    pub comment: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        let method = if cfg!(feature = "deflate") {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        Self {
            method,
            level: DEFAULT_LEVEL,
            comment: None,
        }
    }
}

impl WriteOptions {
    /// Creates new write options with defaults.
    ///
    /// The default method is Deflated when the `deflate` feature is enabled
    /// and Stored otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default compression method.
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the compression level (strict validation).
    ///
    /// Valid values are 0-9, where:
    /// - 0: No compression (deflate framing only)
    /// - 1-3: Fast compression, lower ratio
    /// - 4-6: Balanced compression (default is 6)
    /// - 7-9: Maximum compression, slower
    ///
    /// Use [`level_clamped`] instead if you want invalid values to be silently
    /// clamped to 9 rather than returning an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if level is greater than 9.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zipmerge::write::WriteOptions;
    ///
    /// let opts = WriteOptions::new().level(9)?;
    /// assert_eq!(opts.level, 9);
    ///
    /// assert!(WriteOptions::new().level(15).is_err());
    /// # Ok::<(), zipmerge::Error>(())
    /// ```
    ///
    /// [`level_clamped`]: Self::level_clamped
    /// [`Error::InvalidCompressionLevel`]: crate::Error::InvalidCompressionLevel
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }

    /// Sets the compression level, clamping values above 9.
    ///
    /// [`level`]: Self::level
    pub fn level_clamped(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Sets the archive comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Result of writing an archive.
#[must_use = "write results should be checked to ensure archive was created successfully"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of file entries written.
    pub entries_written: usize,
    /// Number of directory entries written.
    pub directories_written: usize,
    /// Total uncompressed bytes.
    pub total_size: u64,
    /// Total compressed bytes (entry data only).
    pub compressed_size: u64,
    /// Size of the whole archive in bytes.
    pub archive_size: u64,
}
