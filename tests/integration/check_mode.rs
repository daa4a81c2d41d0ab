//! Check mode: pure verification against existing manifests

use super::test_utils::{config, mtime, run, Fixture, BAR_MD5, FOO_MD5};
use dirhash::events::Event;
use dirhash::report::ExitStatus;
use dirhash::types::{Mode, OutcomeKind};

#[test]
fn check_never_touches_the_manifest() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("b.txt", "changed\n");
    fx.file("new.txt", "bar\n");
    let listing = format!("{} *a.txt\n{} *b.txt\n{} *gone.txt\n", FOO_MD5, BAR_MD5, FOO_MD5);
    let manifest = fx.file("Checksums.md5", &listing);
    let before = mtime(&manifest);

    let (summary, sink) = run(&fx.root, &config(Mode::Check));

    assert_eq!(fx.read("Checksums.md5"), listing);
    assert_eq!(mtime(&manifest), before);
    assert_eq!(summary.manifests_written, 0);

    assert_eq!(sink.kinds_for("a.txt"), vec![OutcomeKind::Verified]);
    assert_eq!(sink.kinds_for("b.txt"), vec![OutcomeKind::Corrupt]);
    assert_eq!(sink.kinds_for("gone.txt"), vec![OutcomeKind::Missing]);
    assert_eq!(sink.kinds_for("new.txt"), vec![OutcomeKind::Extra]);
    assert_eq!(summary.status, ExitStatus::VerificationFailed);
    assert_eq!(summary.status.code(), 1);
}

#[test]
fn outcomes_arrive_sorted_by_filename() {
    let fx = Fixture::new();
    fx.file("c.txt", "foo\n");
    fx.file("a.txt", "foo\n");
    fx.file(
        "Checksums.md5",
        &format!("{} *a.txt\n{} *b.txt\n{} *c.txt\n", FOO_MD5, FOO_MD5, FOO_MD5),
    );

    let (_, sink) = run(&fx.root, &config(Mode::Check));
    let names: Vec<String> = sink.outcomes().into_iter().map(|o| o.filename).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
}

#[test]
fn malformed_lines_warn_and_the_rest_is_verified() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");
    fx.file("b.txt", "bar\n");
    fx.file(
        "Checksums.md5",
        &format!("{} *a.txt\nnot a checksum line\n{}  b.txt\n", FOO_MD5, BAR_MD5),
    );

    let (summary, sink) = run(&fx.root, &config(Mode::Check));

    assert_eq!(summary.warnings, 1);
    let warning = sink.events().into_iter().find_map(|event| match event {
        Event::ManifestWarning { message, .. } => Some(message),
        _ => None,
    });
    assert!(warning.unwrap().contains("Line 2"));
    assert_eq!(sink.kinds_for("a.txt"), vec![OutcomeKind::Verified]);
    assert_eq!(sink.kinds_for("b.txt"), vec![OutcomeKind::Verified]);
    assert_eq!(summary.status, ExitStatus::Success);
}

#[test]
fn paths_only_never_hashes() {
    let fx = Fixture::new();
    fx.file("a.txt", "not what was recorded\n");
    fx.file("Checksums.md5", &format!("{} *a.txt\n", FOO_MD5));

    let mut check = config(Mode::Check);
    check.paths_only = true;
    let (summary, sink) = run(&fx.root, &check);

    assert_eq!(sink.kinds_for("a.txt"), vec![OutcomeKind::Verified]);
    assert_eq!(summary.hashed_files, 0);
    assert_eq!(summary.status, ExitStatus::Success);
}

#[test]
fn directory_without_manifest_is_reported_absent() {
    let fx = Fixture::new();
    fx.file("sub/a.txt", "foo\n");

    let (summary, sink) = run(&fx.root, &config(Mode::Check));

    let absent: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::ManifestAbsent { directory } => Some(directory),
            _ => None,
        })
        .collect();
    assert_eq!(absent, vec![fx.path("sub")]);
    assert_eq!(summary.manifests_absent, 1);
    assert_eq!(sink.kinds_for("a.txt"), vec![OutcomeKind::Extra]);
    assert!(!fx.exists("sub/Checksums.md5"));
    assert!(!fx.exists("Checksums.md5"));
}

#[test]
fn absent_manifest_warning_can_be_silenced() {
    let fx = Fixture::new();
    fx.file("a.txt", "foo\n");

    let mut check = config(Mode::Check);
    check.warn_missing_manifest = false;
    let (summary, _) = run(&fx.root, &check);

    assert_eq!(summary.manifests_absent, 0);
}

#[test]
fn empty_tree_checks_clean() {
    let fx = Fixture::new();

    let (summary, sink) = run(&fx.root, &config(Mode::Check));

    assert!(sink.outcomes().is_empty());
    assert_eq!(summary.directories, 1);
    assert_eq!(summary.status, ExitStatus::Success);
}

#[cfg(unix)]
#[test]
fn unreadable_file_is_an_error_not_a_failure() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    let locked = fx.file("locked.txt", "foo\n");
    fx.file("Checksums.md5", &format!("{} *locked.txt\n", FOO_MD5));
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::read(&locked).is_ok() {
        // Running as root; permissions are not enforced.
        return;
    }

    let (summary, sink) = run(&fx.root, &config(Mode::Check));
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(sink.kinds_for("locked.txt"), vec![OutcomeKind::Error]);
    assert_eq!(summary.status, ExitStatus::IoErrors);
    assert_eq!(summary.status.code(), 2);
}
