//! Shared helpers for integration tests.
//!
//! Each test file compiles as its own crate and uses only some of these.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use zipmerge::{Archive, ArchivePath, CompressionMethod, WriteOptions, Writer};

/// Builds an archive in memory from `(name, content)` pairs.
///
/// Names ending in `/` become directory entries.
pub fn build_archive(options: WriteOptions, entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = Writer::create(Vec::new()).unwrap().options(options);
    for (name, data) in entries {
        if let Some(dir) = name.strip_suffix('/') {
            writer.add_directory(ArchivePath::new(dir).unwrap()).unwrap();
        } else {
            writer.add_bytes(ArchivePath::new(name).unwrap(), data).unwrap();
        }
    }
    let (_, data) = writer.finish_into_inner().unwrap();
    data
}

/// Writes an archive with stored entries to `path`.
pub fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let options = WriteOptions::new().method(CompressionMethod::Stored);
    std::fs::write(path, build_archive(options, entries)).unwrap();
}

/// Reads every entry of an in-memory archive as `(name, content)`.
pub fn read_entries(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = Archive::open(Cursor::new(data.to_vec())).unwrap();
    collect(&mut archive)
}

/// Reads every entry of the archive at `path` as `(name, content)`.
pub fn read_path(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = Archive::open_path(path).unwrap();
    collect(&mut archive)
}

/// Returns the entry names of the archive at `path` in order.
pub fn names(path: &Path) -> Vec<String> {
    read_path(path).into_iter().map(|(name, _)| name).collect()
}

/// Lists the temporary files an in-place run could leave behind in `dir`.
pub fn leftover_temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".tmp"))
        .collect()
}

fn collect<R: std::io::Read + std::io::Seek>(archive: &mut Archive<R>) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();
    for index in 0..archive.len() {
        let name = archive.entries()[index].name().to_string();
        let mut data = Vec::new();
        std::io::Read::read_to_end(&mut archive.entry_reader(index).unwrap(), &mut data).unwrap();
        out.push((name, data));
    }
    out
}
