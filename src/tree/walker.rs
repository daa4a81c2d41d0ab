//! Directory enumeration
//!
//! Lists the immediate entries of one directory. Descent is decided by the
//! traversal driver, never here.

use crate::error::{ManifestError, WalkError};
use crate::tree::path;
use crate::types::FileObservation;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Why an entry was left out of the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    Symlink,
    NotRegular,
    Unreadable(String),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::Symlink => f.write_str("symbolic link"),
            IgnoreReason::NotRegular => f.write_str("not a regular file"),
            IgnoreReason::Unreadable(msg) => write!(f, "unreadable: {}", msg),
        }
    }
}

/// Immediate content of one directory, sorted by name
#[derive(Debug, Default)]
pub struct Listing {
    /// Regular files, keyed by basename
    pub files: Vec<FileObservation>,
    pub subdirectories: Vec<PathBuf>,
    /// Manifest files present (filenames only)
    pub manifests: Vec<String>,
    /// Entries excluded by policy
    pub ignored: Vec<(PathBuf, IgnoreReason)>,
    /// Regular files whose names cannot be stored in a manifest
    pub invalid: Vec<(PathBuf, ManifestError)>,
}

/// Enumerator configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Shared manifest filename
    pub manifest_name: String,
    /// Companion extension when every file carries its own manifest
    pub per_file_extension: Option<String>,
    /// Whether to list dot-files and dot-directories
    pub include_hidden: bool,
    /// Whether to follow symbolic links (default: false)
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            manifest_name: crate::manifest::DEFAULT_MANIFEST_NAME.to_string(),
            per_file_extension: None,
            include_hidden: false,
            follow_symlinks: false,
        }
    }
}

/// Directory enumerator
#[derive(Debug, Clone, Default)]
pub struct Walker {
    config: WalkerConfig,
}

impl Walker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Whether `name` is a manifest file under the current layout
    pub fn is_manifest_name(&self, name: &str) -> bool {
        match &self.config.per_file_extension {
            Some(ext) => {
                let suffix = format!(".{}", ext.to_ascii_lowercase());
                let lower = name.to_ascii_lowercase();
                lower.len() > suffix.len() && lower.ends_with(&suffix)
            }
            None => name == self.config.manifest_name,
        }
    }

    /// A dot-named shared manifest is still a manifest when hidden entries
    /// are excluded.
    fn is_shared_manifest(&self, name: &OsStr) -> bool {
        self.config.per_file_extension.is_none() && name == self.config.manifest_name.as_str()
    }

    /// List the immediate entries of `directory`.
    ///
    /// Only a failure to read the directory itself is an error; problems with
    /// single entries land in [`Listing::ignored`].
    pub fn enumerate(&self, directory: &Path) -> Result<Listing, WalkError> {
        let mut listing = Listing::default();

        let walker = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if e.depth() == 0 {
                        return Err(WalkError::ListFailed {
                            path: directory.to_path_buf(),
                            message: e.to_string(),
                        });
                    }
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| directory.to_path_buf());
                    listing
                        .ignored
                        .push((path, IgnoreReason::Unreadable(e.to_string())));
                    continue;
                }
            };

            let name = entry.file_name();
            let hidden = name.to_string_lossy().starts_with('.');
            if hidden && !self.config.include_hidden && !self.is_shared_manifest(name) {
                continue;
            }

            let entry_path = entry.path().to_path_buf();
            let file_type = entry.file_type();

            if file_type.is_symlink() {
                listing.ignored.push((entry_path, IgnoreReason::Symlink));
                continue;
            }
            if file_type.is_dir() {
                listing.subdirectories.push(entry_path);
                continue;
            }
            if !file_type.is_file() {
                listing.ignored.push((entry_path, IgnoreReason::NotRegular));
                continue;
            }

            let key = match path::name_key(name) {
                Ok(key) => key,
                Err(e) => {
                    listing.invalid.push((entry_path, e));
                    continue;
                }
            };

            if self.is_manifest_name(&key) {
                listing.manifests.push(key);
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    listing
                        .ignored
                        .push((entry_path, IgnoreReason::Unreadable(e.to_string())));
                    continue;
                }
            };

            listing.files.push(FileObservation {
                name: key,
                path: entry_path,
                size: metadata.len(),
                modified: metadata.modified().ok(),
            });
        }

        Ok(listing)
    }
}
