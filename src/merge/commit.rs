//! Output placement: direct writes and atomic in-place replacement.
//!
//! In-place runs write to a temporary file next to the source archive and
//! rename it over the source only after the archive is complete. Until
//! then the source is untouched; any failure deletes the temporary file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Where the output of a run goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Write straight to this path.
    Direct(PathBuf),
    /// Replace this archive atomically.
    InPlace(PathBuf),
}

impl Target {
    /// Chooses the target; fails before any I/O if there is nowhere to
    /// write.
    pub(crate) fn resolve(source: Option<&Path>, destination: Option<&Path>) -> Result<Self> {
        match (source, destination) {
            (Some(src), None) => Ok(Target::InPlace(src.to_path_buf())),
            (Some(src), Some(dst)) if same_file(src, dst) => Ok(Target::InPlace(src.to_path_buf())),
            (_, Some(dst)) => Ok(Target::Direct(dst.to_path_buf())),
            (None, None) => Err(Error::InvalidConfiguration(
                "a source archive or a destination is required".into(),
            )),
        }
    }

    pub(crate) fn is_in_place(&self) -> bool {
        matches!(self, Target::InPlace(_))
    }

    pub(crate) fn path(&self) -> &Path {
        match self {
            Target::Direct(path) | Target::InPlace(path) => path,
        }
    }
}

/// Returns true if both paths resolve to the same existing file.
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// The file receiving the archive bytes.
#[derive(Debug)]
pub(crate) enum StagedFile {
    Direct(File),
    InPlace(NamedTempFile),
}

impl StagedFile {
    /// Creates the output file for `target`.
    pub(crate) fn create(target: &Target) -> Result<BufWriter<Self>> {
        let staged = match target {
            Target::Direct(path) => StagedFile::Direct(File::create(path)?),
            Target::InPlace(path) => {
                let dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };
                let temp = tempfile::Builder::new()
                    .prefix(".zipmerge-")
                    .suffix(".tmp")
                    .tempfile_in(dir)?;
                log::debug!("staging {} in {}", path.display(), temp.path().display());
                StagedFile::InPlace(temp)
            }
        };
        Ok(BufWriter::new(staged))
    }

    /// Makes the written archive visible at `target`.
    pub(crate) fn commit(sink: BufWriter<Self>, target: &Target) -> Result<()> {
        let staged = sink.into_inner().map_err(|e| e.into_error())?;
        match staged {
            StagedFile::Direct(mut file) => {
                file.flush()?;
                log::debug!("wrote {}", target.path().display());
            }
            StagedFile::InPlace(temp) => {
                let path = target.path();
                let permissions = fs::metadata(path)?.permissions();
                temp.as_file().set_permissions(permissions)?;
                temp.as_file().sync_all()?;
                temp.persist(path).map_err(|e| Error::Io(e.error))?;
                log::debug!("replaced {}", path.display());
            }
        }
        Ok(())
    }

    /// Discards a staged output. Direct outputs keep their partial file.
    pub(crate) fn rollback(sink: BufWriter<Self>) {
        let (staged, _) = sink.into_parts();
        if let StagedFile::InPlace(temp) = staged {
            let path = temp.path().to_path_buf();
            if let Err(e) = temp.close() {
                log::warn!("failed to remove temporary file {}: {}", path.display(), e);
            } else {
                log::debug!("rolled back, removed {}", path.display());
            }
        }
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            StagedFile::Direct(file) => file.write(buf),
            StagedFile::InPlace(temp) => temp.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            StagedFile::Direct(file) => file.flush(),
            StagedFile::InPlace(temp) => temp.flush(),
        }
    }
}
