//! Fuzz target for opening and reading arbitrary bytes as a ZIP archive.
//!
//! Run with: cargo +nightly fuzz run archive_open
//!
//! Parsing and decoding must fail with an error, never panic or hang.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::{Cursor, Read};

fuzz_target!(|data: &[u8]| {
    let Ok(mut archive) = zipmerge::Archive::open(Cursor::new(data)) else {
        return;
    };
    for index in 0..archive.len() {
        let entry = &archive.entries()[index];
        let _ = entry.name();
        let _ = entry.is_directory();
        let _ = entry.modified();

        // Cap the output so declared sizes cannot exhaust memory.
        if let Ok(reader) = archive.entry_reader(index) {
            let mut sink = Vec::new();
            let _ = reader.take(1 << 20).read_to_end(&mut sink);
        }
    }
});
