use dirhash::manifest::{parse, serialize};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn entries() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[^\\n\\r\\x00]{1,40}", "[0-9a-f]{32}", 0..40)
}

proptest! {
    #[test]
    fn serialized_manifest_parses_back(entries in entries()) {
        let bytes = serialize(&entries).unwrap();
        let parsed = parse(&bytes, 32);

        prop_assert!(parsed.warnings.is_empty());
        prop_assert_eq!(parsed.entries, entries);
    }

    #[test]
    fn serialized_lines_are_sorted(entries in entries()) {
        let bytes = serialize(&entries).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let names: Vec<&str> = text
            .lines()
            .map(|line| &line[34..])
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(names.len(), entries.len());
        prop_assert_eq!(names, sorted);
    }

    #[test]
    fn parse_never_panics(raw in prop::collection::vec(any::<u8>(), 0..512)) {
        let parsed = parse(&raw, 32);
        for digest in parsed.entries.values() {
            prop_assert_eq!(digest.len(), 32);
        }
    }

    #[test]
    fn uppercase_digests_are_normalised(entries in entries()) {
        let text: String = entries
            .iter()
            .map(|(name, digest)| format!("{} *{}\n", digest.to_ascii_uppercase(), name))
            .collect();
        let parsed = parse(text.as_bytes(), 32);

        prop_assert_eq!(parsed.entries, entries);
    }
}
