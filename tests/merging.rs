//! End-to-end merge runs against archives on disk.

mod common;

use std::io::{self, Read, Write};
use std::path::Path;

use common::{leftover_temp_files, names, read_path, write_archive};
use zipmerge::format::extra::{self, EXTENDED_TIMESTAMP_ID};
use zipmerge::mapper::{Prefix, StripPrefix};
use zipmerge::source::{BytesSource, ReaderSource};
use zipmerge::transform::StringTransformer;
use zipmerge::{
    Archive, ArchivePath, EntryRecord, EntrySink, Error, Flow, MergeBuilder, Timestamp, WriteOptions,
    Writer,
};

fn bytes(name: &str, data: &str) -> BytesSource {
    BytesSource::new(ArchivePath::new(name).unwrap(), data.as_bytes().to_vec())
}

fn entry<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> Option<&'a [u8]> {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, data)| data.as_slice())
}

fn fixture(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("in.zip");
    write_archive(
        &path,
        &[
            ("a.txt", b"old a"),
            ("docs/", b""),
            ("docs/one.md", b"one"),
            ("docs/two.md", b"two"),
            ("z.txt", b"z"),
        ],
    );
    path
}

#[test]
fn test_added_entry_replaces_existing() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    let result = MergeBuilder::from_archive(&src)
        .add(bytes("a.txt", "new a"))
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    let entries = read_path(&out);
    assert_eq!(entry(&entries, "a.txt"), Some(&b"new a"[..]));
    assert_eq!(entries.iter().filter(|(n, _)| n == "a.txt").count(), 1);
    assert_eq!(result.entries_written, 5);
    assert_eq!(result.entries_added, 1);
    assert_eq!(result.entries_shadowed, 1);
    assert_eq!(names(&out)[0], "a.txt");
}

#[test]
fn test_first_add_wins() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.zip");

    MergeBuilder::new()
        .add(bytes("x", "first"))
        .add(bytes("y", "y"))
        .add(bytes("x", "second"))
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    let entries = read_path(&out);
    assert_eq!(names(&out), vec!["x", "y"]);
    assert_eq!(entry(&entries, "x"), Some(&b"first"[..]));
}

#[test]
fn test_remove_directory_removes_contents() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    let result = MergeBuilder::from_archive(&src)
        .remove("docs")
        .remove("z.txt")
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    assert_eq!(names(&out), vec!["a.txt"]);
    assert_eq!(result.entries_removed, 4);
}

#[test]
fn test_removal_never_hides_added_entry() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    MergeBuilder::from_archive(&src)
        .remove("docs/")
        .add(bytes("docs/one.md", "replacement"))
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    let entries = read_path(&out);
    assert_eq!(names(&out), vec!["docs/one.md", "a.txt", "z.txt"]);
    assert_eq!(entry(&entries, "docs/one.md"), Some(&b"replacement"[..]));
}

#[test]
fn test_name_mapper_renames_and_excludes() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let prefixed = dir.path().join("prefixed.zip");
    let stripped = dir.path().join("stripped.zip");

    MergeBuilder::from_archive(&src)
        .name_mapper(Prefix::new("v2"))
        .destination(&prefixed)
        .build()
        .unwrap()
        .process()
        .unwrap();
    assert_eq!(
        names(&prefixed),
        vec!["v2/a.txt", "v2/docs/", "v2/docs/one.md", "v2/docs/two.md", "v2/z.txt"]
    );

    MergeBuilder::from_archive(&src)
        .name_mapper(StripPrefix::new("docs"))
        .destination(&stripped)
        .build()
        .unwrap()
        .process()
        .unwrap();
    assert_eq!(names(&stripped), vec!["a.txt", "one.md", "two.md", "z.txt"]);
}

#[test]
fn test_mapped_collision_keeps_first() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    let flatten = |name: &str| {
        if name.ends_with('/') {
            None
        } else {
            Some(name.rsplit('/').next().unwrap_or(name).to_string())
        }
    };
    MergeBuilder::from_archive(&src)
        .add(bytes("other/one.md", "added"))
        .name_mapper(flatten)
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    let entries = read_path(&out);
    assert_eq!(entry(&entries, "one.md"), Some(&b"added"[..]));
}

#[test]
fn test_unchanged_merge_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    MergeBuilder::from_archive(&src)
        .preserve_timestamps(true)
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    assert_eq!(read_path(&out), read_path(&src));
    let before = zipmerge::Archive::open_path(&src).unwrap();
    let after = zipmerge::Archive::open_path(&out).unwrap();
    for (a, b) in before.entries().iter().zip(after.entries()) {
        assert_eq!(a.modified(), b.modified());
        assert_eq!(a.is_directory(), b.is_directory());
    }
}

#[test]
fn test_in_place_update() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());

    let config = MergeBuilder::from_archive(&src)
        .add(bytes("new.txt", "new"))
        .remove("z.txt")
        .build()
        .unwrap();
    assert!(config.is_in_place());
    config.process().unwrap();

    assert_eq!(
        names(&src),
        vec!["new.txt", "a.txt", "docs/", "docs/one.md", "docs/two.md"]
    );
    assert!(leftover_temp_files(dir.path()).is_empty());
}

#[test]
fn test_in_place_failure_leaves_source_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let original = std::fs::read(&src).unwrap();

    let failing = ReaderSource::new(ArchivePath::new("broken").unwrap(), || {
        Err::<io::Empty, _>(io::Error::other("source unavailable"))
    });
    let err = MergeBuilder::from_archive(&src)
        .add(bytes("first", "1"))
        .add(failing)
        .build()
        .unwrap()
        .process()
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert_eq!(std::fs::read(&src).unwrap(), original);
    assert!(leftover_temp_files(dir.path()).is_empty());
}

#[test]
fn test_transformer_failure_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let original = std::fs::read(&src).unwrap();

    let failing = |_: &mut dyn Read, _: &EntryRecord, _: &mut dyn EntrySink| -> zipmerge::Result<()> {
        Err(Error::InvalidConfiguration("refused".into()))
    };
    let result = MergeBuilder::from_archive(&src)
        .transformer("docs/two.md", failing)
        .build()
        .unwrap()
        .process();

    assert!(result.is_err());
    assert_eq!(std::fs::read(&src).unwrap(), original);
    assert!(leftover_temp_files(dir.path()).is_empty());
}

#[test]
fn test_transformer_fires_once_on_winning_entry() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    let result = MergeBuilder::from_archive(&src)
        .add(bytes("a.txt", "added"))
        .add(bytes("a.txt", "ignored"))
        .transformer(
            "a.txt",
            StringTransformer::new(|text: String| Ok(format!("[{}]", text))),
        )
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    let entries = read_path(&out);
    assert_eq!(entry(&entries, "a.txt"), Some(&b"[added]"[..]));
    assert_eq!(result.entries_transformed, 1);
}

#[test]
fn test_transformer_matches_output_name() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    MergeBuilder::from_archive(&src)
        .name_mapper(Prefix::new("v2"))
        .transformer("v2/z.txt", StringTransformer::new(|t: String| Ok(t.repeat(3))))
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    let entries = read_path(&out);
    assert_eq!(entry(&entries, "v2/z.txt"), Some(&b"zzz"[..]));
}

#[test]
fn test_transformer_can_split_entry() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    let split = |input: &mut dyn Read, record: &EntryRecord, sink: &mut dyn EntrySink| -> zipmerge::Result<()> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        for (i, ch) in text.chars().enumerate() {
            sink.start_entry(&EntryRecord::new(format!("{}.{}", record.name, i)))?;
            write!(sink, "{}", ch)?;
            sink.finish_entry()?;
        }
        Ok(())
    };
    let result = MergeBuilder::from_archive(&src)
        .transformer("docs/two.md", split)
        .destination(&out)
        .build()
        .unwrap()
        .process()
        .unwrap();

    assert_eq!(
        names(&out),
        vec![
            "a.txt",
            "docs/",
            "docs/one.md",
            "docs/two.md.0",
            "docs/two.md.1",
            "docs/two.md.2",
            "z.txt"
        ]
    );
    assert_eq!(result.entries_written, 7);
}

#[test]
fn test_stop_finishes_direct_output() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    let mut seen = 0;
    let result = MergeBuilder::from_archive(&src)
        .destination(&out)
        .build()
        .unwrap()
        .process_with(|_| {
            seen += 1;
            if seen == 2 { Flow::Stop } else { Flow::Continue }
        })
        .unwrap();

    assert!(result.stopped);
    assert_eq!(names(&out), vec!["a.txt", "docs/"]);
}

#[test]
fn test_stop_in_place_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let original = std::fs::read(&src).unwrap();

    let result = MergeBuilder::from_archive(&src)
        .add(bytes("new.txt", "new"))
        .build()
        .unwrap()
        .process_with(|_| Flow::Stop)
        .unwrap();

    assert!(result.stopped);
    assert_eq!(result.entries_written, 0);
    assert_eq!(result.entries_added, 0);
    assert_eq!(result.entries_copied, 0);
    assert_eq!(std::fs::read(&src).unwrap(), original);
    assert!(leftover_temp_files(dir.path()).is_empty());
}

#[test]
fn test_oversized_comment_rolls_back_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let original = std::fs::read(&src).unwrap();

    let err = MergeBuilder::from_archive(&src)
        .add(bytes("new.txt", "new"))
        .write_options(WriteOptions::new().comment("x".repeat(70_000)))
        .build()
        .unwrap()
        .process()
        .unwrap_err();

    assert!(matches!(err, Error::InvalidConfiguration(_)));
    assert_eq!(std::fs::read(&src).unwrap(), original);
    assert!(leftover_temp_files(dir.path()).is_empty());
}

#[test]
fn test_reset_timestamps_drops_extended_time() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("stamped.zip");
    // UT block: flags, then the 2001-02-03 modification time
    let mut ut = vec![0x55, 0x54, 0x05, 0x00, 0x01];
    ut.extend_from_slice(&981_173_106u32.to_le_bytes());
    let record = EntryRecord::new("a.txt")
        .with_mod_time(Timestamp::from_unix_secs(981_173_106))
        .with_extra(ut);
    let mut writer = Writer::create_path(&src).unwrap();
    writer.add_record(&record, b"a").unwrap();
    let written = writer.finish().unwrap();
    assert_eq!(written.entries_written, 1);

    let time_extra = |path: &Path| {
        let archive = Archive::open_path(path).unwrap();
        let extra = archive.entry("a.txt").unwrap().record.extra.clone();
        extra::find(&extra.unwrap_or_default(), EXTENDED_TIMESTAMP_ID).map(<[u8]>::to_vec)
    };
    assert!(time_extra(&src).is_some());

    let reset = dir.path().join("reset.zip");
    MergeBuilder::from_archive(&src)
        .preserve_timestamps(false)
        .destination(&reset)
        .build()
        .unwrap()
        .process()
        .unwrap();
    assert_eq!(time_extra(&reset), None);

    let kept = dir.path().join("kept.zip");
    MergeBuilder::from_archive(&src)
        .preserve_timestamps(true)
        .destination(&kept)
        .build()
        .unwrap()
        .process()
        .unwrap();
    assert_eq!(time_extra(&kept), time_extra(&src));
}

#[test]
fn test_iterate_info_never_opens_content() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());

    // a.txt gets an unknown method, docs/one.md the encryption flag
    let mut data = std::fs::read(&src).unwrap();
    let headers: Vec<usize> = data
        .windows(4)
        .enumerate()
        .filter(|(_, w)| *w == b"PK\x01\x02")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(headers.len(), 5);
    data[headers[0] + 10] = 99;
    data[headers[2] + 8] |= 0x01;
    std::fs::write(&src, &data).unwrap();

    let unreadable = ReaderSource::new(ArchivePath::new("stream.bin").unwrap(), || {
        Err::<io::Empty, _>(io::Error::other("content must not be opened"))
    });
    let config = MergeBuilder::from_archive(&src)
        .add(unreadable)
        .build()
        .unwrap();

    let mut seen = Vec::new();
    config
        .iterate_info(|record| {
            seen.push(record.name.clone());
            Ok(Flow::Continue)
        })
        .unwrap();
    assert_eq!(
        seen,
        vec!["stream.bin", "a.txt", "docs/", "docs/one.md", "docs/two.md", "z.txt"]
    );

    let err = config.iterate(|_, _| Ok(Flow::Continue)).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_iterate_matches_process_output() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());
    let out = dir.path().join("out.zip");

    let config = MergeBuilder::from_archive(&src)
        .add(bytes("docs/one.md", "added"))
        .remove("z.txt")
        .destination(&out)
        .build()
        .unwrap();

    let mut iterated = Vec::new();
    config
        .iterate(|record, content| {
            let mut data = Vec::new();
            content.read_to_end(&mut data)?;
            iterated.push((record.name.clone(), data));
            Ok(Flow::Continue)
        })
        .unwrap();

    let mut info = Vec::new();
    config
        .iterate_info(|record| {
            info.push(record.name.clone());
            Ok(Flow::Continue)
        })
        .unwrap();

    config.process().unwrap();
    assert_eq!(iterated, read_path(&out));
    assert_eq!(info, names(&out));
}

#[test]
fn test_iterate_callback_error_stops() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture(dir.path());

    let mut calls = 0;
    let err = MergeBuilder::from_archive(&src)
        .build()
        .unwrap()
        .iterate_info(|_| {
            calls += 1;
            Err(Error::InvalidConfiguration("stop here".into()))
        })
        .unwrap_err();
    assert!(err.is_configuration_error());
    assert_eq!(calls, 1);
}

#[test]
fn test_missing_source_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.zip");

    let result = MergeBuilder::from_archive(dir.path().join("missing.zip"))
        .destination(&out)
        .build()
        .unwrap()
        .process();
    assert!(result.is_err());
    assert!(!out.exists());
}

#[cfg(feature = "tree")]
#[test]
fn test_add_directory_tree() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("site");
    std::fs::create_dir_all(root.join("css")).unwrap();
    std::fs::write(root.join("index.html"), b"<html>").unwrap();
    std::fs::write(root.join("css/main.css"), b"body{}").unwrap();
    std::fs::write(root.join("notes.bak"), b"skip").unwrap();

    let flat = dir.path().join("flat.zip");
    MergeBuilder::new()
        .add_file_with(&root, false, |p: &Path| {
            p.extension().is_none_or(|ext| ext != "bak")
        })
        .unwrap()
        .destination(&flat)
        .build()
        .unwrap()
        .process()
        .unwrap();
    assert_eq!(names(&flat), vec!["css/main.css", "index.html"]);

    let rooted = dir.path().join("rooted.zip");
    MergeBuilder::new()
        .add_file_with(&root, true, |_: &Path| true)
        .unwrap()
        .destination(&rooted)
        .build()
        .unwrap()
        .process()
        .unwrap();
    let entries = read_path(&rooted);
    assert_eq!(
        names(&rooted),
        vec!["site/css/main.css", "site/index.html", "site/notes.bak"]
    );
    assert_eq!(entry(&entries, "site/index.html"), Some(&b"<html>"[..]));
}
