//! Write mode: full rebuilds and the overwrite policy

use super::test_utils::{config, run, Fixture, BAR_MD5, FOO_MD5};
use dirhash::conflict::{ConflictDecision, ConflictResolver, ConflictState, FixedResolver};
use dirhash::events::{CollectingSink, Event, SkipReason};
use dirhash::error::DirhashError;
use dirhash::traverse::Traversal;
use dirhash::tree::Md5Hasher;
use dirhash::types::{Mode, OutcomeKind};
use std::cell::Cell;
use std::path::PathBuf;

/// Answers every conflict the same way and counts how often it was asked
struct CountingResolver {
    answer: ConflictDecision,
    calls: Cell<usize>,
}

impl CountingResolver {
    fn new(answer: ConflictDecision) -> Self {
        Self {
            answer,
            calls: Cell::new(0),
        }
    }
}

impl ConflictResolver for CountingResolver {
    fn resolve(&self, _manifests: &[PathBuf]) -> ConflictDecision {
        self.calls.set(self.calls.get() + 1);
        self.answer
    }
}

#[test]
fn write_records_every_file_in_every_directory() {
    let fx = Fixture::new();
    fx.file("b.txt", "bar\n");
    fx.file("a.txt", "foo\n");
    fx.file("sub/c.txt", "foo\n");

    let (summary, sink) = run(&fx.root, &config(Mode::Write));

    assert_eq!(
        fx.read("Checksums.md5"),
        format!("{} *a.txt\n{} *b.txt\n", FOO_MD5, BAR_MD5)
    );
    assert_eq!(fx.read("sub/Checksums.md5"), format!("{} *c.txt\n", FOO_MD5));
    assert_eq!(summary.added, 3);
    assert_eq!(summary.hashed_files, 3);
    assert_eq!(summary.hashed_bytes, 12);
    assert!(sink.outcomes().iter().all(|o| o.kind == OutcomeKind::Added));
}

#[test]
fn write_discards_stale_entries() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("Checksums.md5", &format!("{} *old.txt\n", BAR_MD5));

    let mut write = config(Mode::Write);
    write.overwrite = true;
    let (_, sink) = run(&fx.root, &write);

    assert_eq!(fx.read("Checksums.md5"), format!("{} *a.txt\n", FOO_MD5));
    assert!(sink.kinds_for("old.txt").is_empty());
}

#[test]
fn existing_manifest_is_kept_unless_overwrite_is_chosen() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    let listing = format!("{} *a.txt\n", BAR_MD5);
    fx.file("Checksums.md5", &listing);

    let (summary, sink) = run(&fx.root, &config(Mode::Write));

    assert_eq!(fx.read("Checksums.md5"), listing);
    assert_eq!(summary.directories_skipped, 1);
    assert!(sink.events().iter().any(|event| matches!(
        event,
        Event::DirectorySkipped {
            reason: SkipReason::Conflict,
            ..
        }
    )));

    let write = config(Mode::Write);
    let sink = CollectingSink::new();
    let always = FixedResolver(ConflictDecision::OverwriteAll);
    Traversal::new(&write, &Md5Hasher)
        .with_sink(&sink)
        .with_resolver(&always)
        .run(&fx.root)
        .unwrap();
    assert_eq!(fx.read("Checksums.md5"), format!("{} *a.txt\n", FOO_MD5));
}

#[test]
fn empty_manifest_is_not_a_conflict() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("Checksums.md5", "");

    let (summary, sink) = run(&fx.root, &config(Mode::Write));

    assert!(!sink
        .events()
        .iter()
        .any(|event| matches!(event, Event::ManifestConflict { .. })));
    assert_eq!(summary.added, 1);
    assert_eq!(fx.read("Checksums.md5"), format!("{} *a.txt\n", FOO_MD5));
}

#[test]
fn abort_stops_the_run() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("Checksums.md5", &format!("{} *a.txt\n", BAR_MD5));

    let write = config(Mode::Write);
    let abort = FixedResolver(ConflictDecision::Abort);
    let result = Traversal::new(&write, &Md5Hasher)
        .with_resolver(&abort)
        .run(&fx.root);

    assert!(matches!(result, Err(DirhashError::Aborted(_))));
    assert_eq!(fx.read("Checksums.md5"), format!("{} *a.txt\n", BAR_MD5));
}

#[test]
fn forced_overwrite_still_reports_the_conflict() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("Checksums.md5", &format!("{} *a.txt\n", BAR_MD5));

    let mut write = config(Mode::Write);
    write.overwrite = true;
    let sink = CollectingSink::new();
    let never = CountingResolver::new(ConflictDecision::Abort);
    Traversal::new(&write, &Md5Hasher)
        .with_sink(&sink)
        .with_resolver(&never)
        .run(&fx.root)
        .unwrap();

    assert_eq!(never.calls.get(), 0);
    let conflicts: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::ManifestConflict {
                manifests,
                decision,
            } => Some((manifests, decision)),
            _ => None,
        })
        .collect();
    assert_eq!(
        conflicts,
        vec![(vec![fx.path("Checksums.md5")], ConflictDecision::OverwriteAll)]
    );
    assert_eq!(fx.read("Checksums.md5"), format!("{} *a.txt\n", FOO_MD5));
}

#[test]
fn skip_all_answer_carries_over_to_later_roots() {
    let first = Fixture::new();
    let second = Fixture::new();
    for fx in [&first, &second] {
        fx.file("a.txt", "foo\n");
        fx.file("Checksums.md5", &format!("{} *a.txt\n", BAR_MD5));
    }

    let write = config(Mode::Write);
    let resolver = CountingResolver::new(ConflictDecision::SkipAll);
    let mut conflicts = ConflictState::new(write.overwrite);
    for fx in [&first, &second] {
        let summary = Traversal::new(&write, &Md5Hasher)
            .with_resolver(&resolver)
            .run_with_conflicts(&fx.root, &mut conflicts)
            .unwrap();
        assert_eq!(summary.directories_skipped, 1);
        assert_eq!(fx.read("Checksums.md5"), format!("{} *a.txt\n", BAR_MD5));
    }
    assert_eq!(resolver.calls.get(), 1);
}

#[test]
fn separate_runs_ask_again() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("Checksums.md5", &format!("{} *a.txt\n", BAR_MD5));

    let write = config(Mode::Write);
    let resolver = CountingResolver::new(ConflictDecision::SkipAll);
    for _ in 0..2 {
        Traversal::new(&write, &Md5Hasher)
            .with_resolver(&resolver)
            .run(&fx.root)
            .unwrap();
    }
    assert_eq!(resolver.calls.get(), 2);
}
