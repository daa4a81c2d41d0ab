//! Subtree manifests: one manifest at a root governing everything below it

use super::test_utils::{config, run, Fixture, BAR_MD5, FOO_MD5};
use dirhash::config::{RunConfig, SubtreeDetection};
use dirhash::events::{Event, SkipReason};
use dirhash::report::ExitStatus;
use dirhash::types::{Mode, OutcomeKind};

fn subtree(mode: Mode) -> RunConfig {
    let mut config = config(mode);
    config.subtree_manifest = true;
    config
}

#[test]
fn write_records_relative_paths_in_root_manifest() {
    let fx = Fixture::new();
    fx.file("top.txt", "foo\n");
    fx.file("a/b/deep.txt", "bar\n");

    let (summary, _) = run(&fx.root, &subtree(Mode::Write));

    assert_eq!(
        fx.read("Checksums.md5"),
        format!("{} *a/b/deep.txt\n{} *top.txt\n", BAR_MD5, FOO_MD5)
    );
    assert!(!fx.exists("a/Checksums.md5"));
    assert!(!fx.exists("a/b/Checksums.md5"));
    assert_eq!(summary.directories, 1);
}

#[test]
fn check_finds_moved_file_as_missing_and_extra() {
    let fx = Fixture::new();
    fx.file("a/x.txt", "foo\n");
    run(&fx.root, &subtree(Mode::Write));
    std::fs::rename(fx.path("a/x.txt"), fx.path("x.txt")).unwrap();

    let (summary, sink) = run(&fx.root, &subtree(Mode::Check));

    assert_eq!(sink.kinds_for("a/x.txt"), vec![OutcomeKind::Missing]);
    assert_eq!(sink.kinds_for("x.txt"), vec![OutcomeKind::Extra]);
    assert_eq!(summary.status, ExitStatus::VerificationFailed);
}

#[test]
fn nested_manifest_directory_is_left_alone() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("own/b.txt", "bar\n");
    fx.file("own/Checksums.md5", &format!("{} *b.txt\n", BAR_MD5));

    let (_, sink) = run(&fx.root, &subtree(Mode::Write));

    assert_eq!(fx.read("Checksums.md5"), format!("{} *a.txt\n", FOO_MD5));
    assert_eq!(fx.read("own/Checksums.md5"), format!("{} *b.txt\n", BAR_MD5));
    assert!(sink.events().iter().any(|event| matches!(
        event,
        Event::DirectorySkipped {
            reason: SkipReason::NestedManifest,
            directory,
        } if *directory == fx.path("own")
    )));
}

#[test]
fn depth_limit_bounds_the_subtree() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("one/b.txt", "foo\n");
    fx.file("one/two/c.txt", "foo\n");

    let mut write = subtree(Mode::Write);
    write.max_depth = Some(1);
    run(&fx.root, &write);

    let listing = fx.read("Checksums.md5");
    assert!(listing.contains("*one/b.txt"));
    assert!(!listing.contains("c.txt"));
}

#[test]
fn auto_detection_recognises_existing_subtree_manifest() {
    let fx = Fixture::new();
    fx.file("data/x/a.txt", "foo\n");
    fx.file("data/x/y/b.txt", "bar\n");
    fx.file(
        "data/x/Checksums.md5",
        &format!("{} *a.txt\n{} *y/b.txt\n", FOO_MD5, BAR_MD5),
    );

    let mut check = config(Mode::Check);
    check.subtree_detection = SubtreeDetection::Auto;
    let (summary, sink) = run(&fx.root, &check);

    assert_eq!(sink.kinds_for("a.txt"), vec![OutcomeKind::Verified]);
    assert_eq!(sink.kinds_for("y/b.txt"), vec![OutcomeKind::Verified]);
    assert!(sink.kinds_for("b.txt").is_empty());
    assert!(!fx.exists("data/x/y/Checksums.md5"));
    assert_eq!(summary.status, ExitStatus::Success);
}

#[test]
fn explicit_detection_treats_nested_keys_as_missing() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("y/b.txt", "bar\n");
    fx.file(
        "Checksums.md5",
        &format!("{} *a.txt\n{} *y/b.txt\n", FOO_MD5, BAR_MD5),
    );

    let (_, sink) = run(&fx.root, &config(Mode::Check));

    assert_eq!(sink.kinds_for("y/b.txt"), vec![OutcomeKind::Missing]);
    assert_eq!(sink.kinds_for("b.txt"), vec![OutcomeKind::Extra]);
}

#[test]
fn entries_beyond_the_depth_limit_are_kept() {
    let fx = Fixture::new();
    fx.file("top.txt", "foo\n");
    fx.file("a/one.txt", "bar\n");
    run(&fx.root, &subtree(Mode::Write));
    let recorded = format!("{} *a/one.txt\n{} *top.txt\n", BAR_MD5, FOO_MD5);
    assert_eq!(fx.read("Checksums.md5"), recorded);

    let mut update = subtree(Mode::Update);
    update.delete = true;
    update.max_depth = Some(0);
    let (summary, sink) = run(&fx.root, &update);

    assert_eq!(sink.kinds_for("a/one.txt"), vec![OutcomeKind::Skipped]);
    assert_eq!(summary.removed, 0);
    assert!(fx.exists("a/one.txt"));
    assert_eq!(fx.read("Checksums.md5"), recorded);

    let mut check = subtree(Mode::Check);
    check.max_depth = Some(0);
    let (summary, sink) = run(&fx.root, &check);
    assert_eq!(sink.kinds_for("a/one.txt"), vec![OutcomeKind::Skipped]);
    assert_eq!(sink.kinds_for("top.txt"), vec![OutcomeKind::Verified]);
    assert_eq!(summary.missing, 0);
    assert_eq!(summary.status, ExitStatus::Success);
}

#[test]
fn entries_under_a_nested_manifest_are_kept() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("own/b.txt", "bar\n");
    run(&fx.root, &subtree(Mode::Write));
    fx.file("own/Checksums.md5", &format!("{} *b.txt\n", BAR_MD5));

    let mut update = subtree(Mode::Update);
    update.delete = true;
    let (summary, sink) = run(&fx.root, &update);

    assert_eq!(sink.kinds_for("own/b.txt"), vec![OutcomeKind::Skipped]);
    assert_eq!(summary.removed, 0);
    assert_eq!(
        fx.read("Checksums.md5"),
        format!("{} *a.txt\n{} *own/b.txt\n", FOO_MD5, BAR_MD5)
    );
}

#[test]
fn deleted_file_in_a_scanned_directory_is_still_removed() {
    let fx = Fixture::new();
    fx.file("top.txt", "foo\n");
    fx.file("a/one.txt", "bar\n");
    fx.file("a/b/two.txt", "bar\n");
    run(&fx.root, &subtree(Mode::Write));
    std::fs::remove_file(fx.path("a/one.txt")).unwrap();

    let mut update = subtree(Mode::Update);
    update.delete = true;
    update.max_depth = Some(1);
    let (summary, sink) = run(&fx.root, &update);

    assert_eq!(sink.kinds_for("a/one.txt"), vec![OutcomeKind::Removed]);
    assert_eq!(sink.kinds_for("a/b/two.txt"), vec![OutcomeKind::Skipped]);
    assert_eq!(summary.removed, 1);
    assert_eq!(
        fx.read("Checksums.md5"),
        format!("{} *a/b/two.txt\n{} *top.txt\n", BAR_MD5, FOO_MD5)
    );
}
