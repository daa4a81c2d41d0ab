//! The manifests governing one directory
//!
//! Either a single shared manifest (per-directory or per-subtree), or one
//! single-entry companion manifest per file (`<file>.<ext>`). The engine
//! addresses entries by key and never cares which layout backs them.

use super::Manifest;
use crate::error::ManifestError;
use crate::types::Digest;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What persisting a manifest did on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistAction {
    Written { entries: usize },
    Removed,
}

/// Result of persisting one manifest of a set
pub type PersistResult = (PathBuf, Result<PersistAction, ManifestError>);

#[derive(Debug)]
pub enum ManifestSet {
    Shared(Manifest),
    PerFile {
        directory: PathBuf,
        extension: String,
        /// Companion manifests keyed by their own filename
        manifests: BTreeMap<String, Manifest>,
        /// Entry key -> companion filename
        index: BTreeMap<String, String>,
    },
}

impl ManifestSet {
    pub fn shared(manifest: Manifest) -> Self {
        ManifestSet::Shared(manifest)
    }

    /// Load the companion manifests of a directory.
    ///
    /// Returns the set and the per-manifest warnings. A companion that cannot
    /// be read aborts loading: the directory must not be rewritten from a
    /// partial view.
    pub fn load_per_file(
        directory: &Path,
        companions: &[String],
        extension: &str,
        digest_len: usize,
    ) -> Result<(Self, Vec<(PathBuf, ManifestError)>), ManifestError> {
        let mut manifests = BTreeMap::new();
        let mut index = BTreeMap::new();
        let mut warnings = Vec::new();

        for companion in companions {
            let path = directory.join(companion);
            let (manifest, issues) = Manifest::load(&path, digest_len)?;
            warnings.extend(issues.into_iter().map(|issue| (path.clone(), issue)));
            for key in manifest.entries().keys() {
                index.insert(key.clone(), companion.clone());
            }
            manifests.insert(companion.clone(), manifest);
        }

        Ok((
            ManifestSet::PerFile {
                directory: directory.to_path_buf(),
                extension: extension.to_string(),
                manifests,
                index,
            },
            warnings,
        ))
    }

    /// Companion set whose existing files are only stat'ed, not read.
    pub fn stat_per_file(
        directory: &Path,
        companions: &[String],
        extension: &str,
    ) -> Result<Self, ManifestError> {
        let mut manifests = BTreeMap::new();
        for companion in companions {
            manifests.insert(companion.clone(), Manifest::stat(directory.join(companion))?);
        }
        Ok(ManifestSet::PerFile {
            directory: directory.to_path_buf(),
            extension: extension.to_string(),
            manifests,
            index: BTreeMap::new(),
        })
    }

    /// All entries across the set
    pub fn entries(&self) -> BTreeMap<String, Digest> {
        match self {
            ManifestSet::Shared(manifest) => manifest.entries().clone(),
            ManifestSet::PerFile { manifests, index, .. } => index
                .iter()
                .filter_map(|(key, companion)| {
                    manifests
                        .get(companion)
                        .and_then(|m| m.get(key))
                        .map(|digest| (key.clone(), digest.to_string()))
                })
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            ManifestSet::Shared(manifest) => manifest.get(key),
            ManifestSet::PerFile { manifests, index, .. } => index
                .get(key)
                .and_then(|companion| manifests.get(companion))
                .and_then(|m| m.get(key)),
        }
    }

    /// Last-modified time of the manifest file recording `key`
    pub fn recorded_at(&self, key: &str) -> Option<SystemTime> {
        match self {
            ManifestSet::Shared(manifest) => manifest.modified(),
            ManifestSet::PerFile { manifests, index, .. } => index
                .get(key)
                .and_then(|companion| manifests.get(companion))
                .and_then(Manifest::modified),
        }
    }

    pub fn insert(&mut self, key: &str, digest: Digest) {
        match self {
            ManifestSet::Shared(manifest) => manifest.insert(key, digest),
            ManifestSet::PerFile {
                directory,
                extension,
                manifests,
                index,
            } => {
                let companion = index
                    .entry(key.to_string())
                    .or_insert_with(|| format!("{}.{}", key, extension))
                    .clone();
                manifests
                    .entry(companion.clone())
                    .or_insert_with(|| Manifest::empty(directory.join(&companion)))
                    .insert(key, digest);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Digest> {
        match self {
            ManifestSet::Shared(manifest) => manifest.remove(key),
            ManifestSet::PerFile { manifests, index, .. } => {
                let companion = index.remove(key)?;
                manifests.get_mut(&companion).and_then(|m| m.remove(key))
            }
        }
    }

    /// Forget all entries; every manifest of the set becomes dirty.
    pub fn clear(&mut self) {
        match self {
            ManifestSet::Shared(manifest) => manifest.clear(),
            ManifestSet::PerFile { manifests, index, .. } => {
                index.clear();
                manifests.values_mut().for_each(Manifest::clear);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ManifestSet::Shared(manifest) => manifest.len(),
            ManifestSet::PerFile { index, .. } => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            ManifestSet::Shared(manifest) => manifest.is_dirty(),
            ManifestSet::PerFile { manifests, .. } => manifests.values().any(Manifest::is_dirty),
        }
    }

    /// Whether any backing file exists at all
    pub fn exists_on_disk(&self) -> bool {
        match self {
            ManifestSet::Shared(manifest) => manifest.exists(),
            ManifestSet::PerFile { manifests, .. } => manifests.values().any(Manifest::exists),
        }
    }

    /// Backing files holding data that a rebuild would overwrite
    pub fn non_empty_files(&self) -> Vec<PathBuf> {
        let manifests: Vec<&Manifest> = match self {
            ManifestSet::Shared(manifest) => vec![manifest],
            ManifestSet::PerFile { manifests, .. } => manifests.values().collect(),
        };
        manifests
            .into_iter()
            .filter(|m| m.has_content_on_disk())
            .map(|m| m.path().to_path_buf())
            .collect()
    }

    /// Persist every dirty manifest.
    ///
    /// A shared manifest is always written, even when empty. A companion
    /// manifest left without entries is deleted instead.
    pub fn persist(&mut self) -> Vec<PersistResult> {
        match self {
            ManifestSet::Shared(manifest) => {
                if !manifest.is_dirty() {
                    return Vec::new();
                }
                let result = manifest.persist().map(|()| PersistAction::Written {
                    entries: manifest.len(),
                });
                vec![(manifest.path().to_path_buf(), result)]
            }
            ManifestSet::PerFile { manifests, .. } => manifests
                .values_mut()
                .filter(|m| m.is_dirty())
                .filter_map(|manifest| {
                    let path = manifest.path().to_path_buf();
                    if manifest.is_empty() {
                        if !manifest.exists() {
                            return None;
                        }
                        let result = manifest.delete_file().map(|()| PersistAction::Removed);
                        Some((path, result))
                    } else {
                        let entries = manifest.len();
                        let result = manifest
                            .persist()
                            .map(|()| PersistAction::Written { entries });
                        Some((path, result))
                    }
                })
                .collect(),
        }
    }
}
