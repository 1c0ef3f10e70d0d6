//! Property-based tests of merge ordering using proptest.

mod common;

use std::collections::HashSet;

use proptest::prelude::*;
use zipmerge::source::BytesSource;
use zipmerge::{ArchivePath, Flow, MergeBuilder};

/// Output names expected for `added` then `existing`, minus `removed`.
fn expected_names(added: &[String], existing: &[String], removed: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in added {
        if seen.insert(name.clone()) {
            out.push(name.clone());
        }
    }
    for name in existing {
        if !removed.contains(name) && seen.insert(name.clone()) {
            out.push(name.clone());
        }
    }
    out
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}(\\.txt)?"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_merge_order_and_dedup(
        existing in proptest::collection::btree_set(name_strategy(), 0..8),
        added in proptest::collection::vec(name_strategy(), 0..8),
        remove_mask in proptest::collection::vec(any::<bool>(), 8),
    ) {
        let existing: Vec<String> = existing.into_iter().collect();
        let removed: HashSet<String> = existing
            .iter()
            .zip(&remove_mask)
            .filter(|(_, remove)| **remove)
            .map(|(name, _)| name.clone())
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.zip");
        let out = dir.path().join("out.zip");
        let pairs: Vec<(&str, &[u8])> = existing
            .iter()
            .map(|n| (n.as_str(), b"existing" as &[u8]))
            .collect();
        common::write_archive(&src, &pairs);

        let mut builder = MergeBuilder::from_archive(&src).destination(&out);
        for (i, name) in added.iter().enumerate() {
            builder = builder.add(BytesSource::new(
                ArchivePath::new(name).unwrap(),
                format!("added {}", i).into_bytes(),
            ));
        }
        let config = builder.remove_all(removed.iter().cloned()).build().unwrap();

        let mut iterated = Vec::new();
        config
            .iterate_info(|record| {
                iterated.push(record.name.clone());
                Ok(Flow::Continue)
            })
            .unwrap();
        let result = config.process().unwrap();

        let expected = expected_names(&added, &existing, &removed);
        let entries = common::read_path(&out);
        let names: Vec<String> = entries.iter().map(|(n, _)| n.clone()).collect();
        prop_assert_eq!(&names, &expected);
        prop_assert_eq!(&iterated, &expected);
        prop_assert_eq!(result.entries_written, expected.len());

        for (name, data) in &entries {
            match added.iter().position(|a| a == name) {
                Some(first) => prop_assert_eq!(data, &format!("added {}", first).into_bytes()),
                None => prop_assert_eq!(data.as_slice(), b"existing".as_slice()),
            }
        }
    }

    #[test]
    fn prop_unchanged_merge_preserves_entries(
        existing in proptest::collection::btree_map(name_strategy(), proptest::collection::vec(any::<u8>(), 0..64), 0..6),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.zip");
        let out = dir.path().join("out.zip");
        let pairs: Vec<(&str, &[u8])> = existing
            .iter()
            .map(|(n, d)| (n.as_str(), d.as_slice()))
            .collect();
        common::write_archive(&src, &pairs);

        MergeBuilder::from_archive(&src)
            .destination(&out)
            .build()
            .unwrap()
            .process()
            .unwrap();

        prop_assert_eq!(common::read_path(&out), common::read_path(&src));
    }
}
