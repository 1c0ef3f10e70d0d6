//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Accepted paths must be relative, NUL-free and free of `.` and `..`
//! segments.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(path_str) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = zipmerge::ArchivePath::new(path_str) else {
        return;
    };
    let normalized = path.as_str();

    assert!(
        !normalized.starts_with('/'),
        "Absolute path accepted: {:?}",
        normalized
    );
    assert!(
        !normalized.contains('\0'),
        "NUL byte in normalized path: {:?}",
        normalized
    );
    assert!(
        normalized
            .trim_end_matches('/')
            .split('/')
            .all(|s| !s.is_empty() && s != "." && s != ".."),
        "Invalid segment accepted: {:?}",
        normalized
    );
});
