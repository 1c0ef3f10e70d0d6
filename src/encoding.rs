//! Entry-name character sets.
//!
//! ZIP entry names are raw bytes. Writers that set general-purpose flag
//! bit 11 promise UTF-8; everything else is in whatever code page the
//! creating tool used (commonly CP437 or a regional DOS code page). A
//! [`NameEncoding`] names the charset used for names without the UTF-8 flag
//! when reading, and for all names when writing.
//!
//! ```rust
//! use zipmerge::NameEncoding;
//!
//! let cyrillic = NameEncoding::for_label("windows-1251").unwrap();
//! let bytes = cyrillic.encode("файл.txt").unwrap();
//! assert_eq!(cyrillic.decode(&bytes, false).unwrap(), "файл.txt");
//! ```

use std::borrow::Cow;
use std::fmt;

use encoding_rs::{Encoding, UTF_8};

use crate::{Error, Result};

/// Character set for entry names and comments.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NameEncoding(&'static Encoding);

impl NameEncoding {
    /// UTF-8, the default.
    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    /// Looks up an encoding by its WHATWG label (e.g. `"utf-8"`,
    /// `"windows-1252"`, `"ibm866"`, `"shift_jis"`).
    ///
    /// Returns `None` for unknown labels.
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(Self)
    }

    /// Wraps an `encoding_rs` encoding.
    pub fn from_encoding(encoding: &'static Encoding) -> Self {
        Self(encoding)
    }

    /// Returns the canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Returns true if names are written as UTF-8 (flag bit 11 set).
    pub fn is_utf8(&self) -> bool {
        self.0.output_encoding() == UTF_8
    }

    /// Decodes a raw name.
    ///
    /// `utf8_flag` is the entry's general-purpose bit 11; when set the name
    /// is UTF-8 regardless of the configured encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameEncoding`] if the bytes are malformed for the
    /// selected encoding.
    pub fn decode(&self, bytes: &[u8], utf8_flag: bool) -> Result<String> {
        let encoding = if utf8_flag { UTF_8 } else { self.0 };
        match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            Some(text) => Ok(text.into_owned()),
            None => Err(Error::NameEncoding {
                name: String::from_utf8_lossy(bytes).into_owned(),
                encoding: encoding.name(),
            }),
        }
    }

    /// Decodes comment text, replacing malformed sequences.
    pub fn decode_lossy(&self, bytes: &[u8], utf8_flag: bool) -> String {
        let encoding = if utf8_flag { UTF_8 } else { self.0 };
        encoding.decode_without_bom_handling(bytes).0.into_owned()
    }

    /// Encodes a name for writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameEncoding`] if the name contains characters the
    /// encoding cannot represent.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        let (bytes, used, unmappable) = self.0.encode(text);
        if unmappable || used != self.0.output_encoding() {
            return Err(Error::NameEncoding {
                name: text.to_string(),
                encoding: self.0.name(),
            });
        }
        Ok(bytes)
    }
}

impl Default for NameEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Debug for NameEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NameEncoding").field(&self.name()).finish()
    }
}

impl fmt::Display for NameEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
