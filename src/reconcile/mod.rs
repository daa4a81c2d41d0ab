//! Reconciliation of one directory against its manifests
//!
//! The driver builds a [`DirectoryContext`] per directory; the [`Reconciler`]
//! turns it into outcome events and, outside check mode, a persisted manifest
//! set.

mod engine;
pub mod pool;

pub use engine::Reconciler;

use crate::manifest::ManifestSet;
use crate::types::FileObservation;
use std::path::PathBuf;

/// Everything known about one directory while it is being processed
#[derive(Debug)]
pub struct DirectoryContext {
    pub directory: PathBuf,
    pub set: ManifestSet,
    /// Observed files, sorted by key
    pub files: Vec<FileObservation>,
    pub subdirectories: Vec<PathBuf>,
    /// Key prefixes of subtree directories that were not enumerated. Entries
    /// under them have no observation but are not known to be gone.
    pub unscanned: Vec<String>,
}

impl DirectoryContext {
    pub fn new(
        directory: impl Into<PathBuf>,
        set: ManifestSet,
        files: Vec<FileObservation>,
    ) -> Self {
        Self {
            directory: directory.into(),
            set,
            files,
            subdirectories: Vec::new(),
            unscanned: Vec::new(),
        }
    }

    /// Whether `key` lies below a directory that was not enumerated
    pub fn is_unscanned(&self, key: &str) -> bool {
        self.unscanned.iter().any(|prefix| key.starts_with(prefix.as_str()))
    }
}
