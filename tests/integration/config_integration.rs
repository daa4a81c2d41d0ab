//! Integration tests for configuration layering

use super::test_utils::with_xdg_env;
use dirhash::config::{ConfigLoader, SubtreeDetection};
use dirhash::types::Mode;
use std::fs;
use tempfile::TempDir;

fn write_global(test_dir: &TempDir, content: &str) {
    let dir = test_dir.path().join("config").join("dirhash");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), content).unwrap();
}

#[test]
fn test_defaults_without_any_file() {
    let test_dir = TempDir::new().unwrap();
    let config = with_xdg_env(&test_dir, || ConfigLoader::load(None).unwrap());

    assert_eq!(config.run.manifest_name, "Checksums.md5");
    assert_eq!(config.run.mode, Mode::Check);
    assert!(config.run.warn_missing_manifest);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_global_file_is_picked_up() {
    let test_dir = TempDir::new().unwrap();
    write_global(
        &test_dir,
        r#"
[run]
manifest_name = "MD5SUMS"
subtree_detection = "auto"
max_depth = 3
"#,
    );

    let config = with_xdg_env(&test_dir, || {
        assert_eq!(
            ConfigLoader::global_config_path().unwrap(),
            test_dir.path().join("config").join("dirhash").join("config.toml")
        );
        ConfigLoader::load(None).unwrap()
    });

    assert_eq!(config.run.manifest_name, "MD5SUMS");
    assert_eq!(config.run.subtree_detection, SubtreeDetection::Auto);
    assert_eq!(config.run.max_depth, Some(3));
}

#[test]
fn test_explicit_file_overrides_global() {
    let test_dir = TempDir::new().unwrap();
    write_global(
        &test_dir,
        r#"
[run]
manifest_name = "MD5SUMS"
include_hidden = true
"#,
    );
    let explicit = test_dir.path().join("project.toml");
    fs::write(
        &explicit,
        r#"
[run]
manifest_name = "project.md5"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load(Some(&explicit)).unwrap());

    assert_eq!(config.run.manifest_name, "project.md5");
    assert!(config.run.include_hidden, "unrelated global keys still apply");
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let test_dir = TempDir::new().unwrap();
    let missing = test_dir.path().join("nope.toml");

    let result = with_xdg_env(&test_dir, || ConfigLoader::load(Some(&missing)));

    assert!(result.is_err());
}

#[test]
fn test_malformed_global_file_is_an_error() {
    let test_dir = TempDir::new().unwrap();
    write_global(&test_dir, "[run\nmanifest_name = ");

    let result = with_xdg_env(&test_dir, || ConfigLoader::load(None));

    assert!(result.is_err());
}
