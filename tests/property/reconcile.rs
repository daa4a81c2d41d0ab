use dirhash::config::RunConfig;
use dirhash::events::CollectingSink;
use dirhash::traverse::Traversal;
use dirhash::tree::Md5Hasher;
use dirhash::types::{Mode, OutcomeKind};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

const FOO_MD5: &str = "d3b07384d113edec49eaa6238ad5ff00";

fn names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z]{1,8}\\.txt", 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Name-only check partitions the union of files and entries exactly.
    #[test]
    fn paths_only_check_partitions_names(on_disk in names(), recorded in names()) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in &on_disk {
            fs::write(root.join(name), "foo\n").unwrap();
        }
        let listing: String = recorded
            .iter()
            .map(|name| format!("{} *{}\n", FOO_MD5, name))
            .collect();
        fs::write(root.join("Checksums.md5"), listing).unwrap();

        let mut config = RunConfig::for_mode(Mode::Check);
        config.paths_only = true;
        let sink = CollectingSink::new();
        let summary = Traversal::new(&config, &Md5Hasher)
            .with_sink(&sink)
            .run(root)
            .unwrap();

        for name in on_disk.union(&recorded) {
            let expected = match (on_disk.contains(name), recorded.contains(name)) {
                (true, true) => OutcomeKind::Verified,
                (false, true) => OutcomeKind::Missing,
                _ => OutcomeKind::Extra,
            };
            prop_assert_eq!(sink.kinds_for(name), vec![expected]);
        }
        prop_assert_eq!(sink.outcomes().len(), on_disk.union(&recorded).count());
        prop_assert_eq!(summary.hashed_files, 0);
    }

    /// A freshly written tree always checks clean.
    #[test]
    fn write_then_check_is_clean(on_disk in names()) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in &on_disk {
            fs::write(root.join(name), name.as_bytes()).unwrap();
        }

        let write = RunConfig::for_mode(Mode::Write);
        Traversal::new(&write, &Md5Hasher).run(root).unwrap();

        let check = RunConfig::for_mode(Mode::Check);
        let sink = CollectingSink::new();
        let summary = Traversal::new(&check, &Md5Hasher)
            .with_sink(&sink)
            .run(root)
            .unwrap();

        prop_assert_eq!(summary.verified, on_disk.len() as u64);
        prop_assert!(sink.outcomes().iter().all(|o| o.kind == OutcomeKind::Verified));
        prop_assert_eq!(summary.status.code(), 0);
    }
}
