//! Checksum manifests
//!
//! A [`Manifest`] is the in-memory form of one manifest file: its entries,
//! the backing file's provenance (path, last-modified time) and a dirty flag.
//! [`ManifestSet`] groups the manifests governing one directory.

pub mod codec;
pub mod set;

pub use codec::{parse, serialize, ParsedManifest};
pub use set::{ManifestSet, PersistAction};

use crate::error::ManifestError;
use crate::types::Digest;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Default shared manifest filename
pub const DEFAULT_MANIFEST_NAME: &str = "Checksums.md5";

/// One manifest file and its entries
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    entries: BTreeMap<String, Digest>,
    /// Last-modified time of the backing file when loaded or last persisted
    modified: Option<SystemTime>,
    /// Size of the backing file; `None` when it does not exist
    on_disk_len: Option<u64>,
    dirty: bool,
}

impl Manifest {
    /// A manifest with no entries and no backing file yet
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            modified: None,
            on_disk_len: None,
            dirty: false,
        }
    }

    /// An empty manifest carrying the backing file's metadata, without
    /// reading its content. Used when the content is going to be replaced.
    pub fn stat(path: impl Into<PathBuf>) -> Result<Self, ManifestError> {
        let mut manifest = Self::empty(path);
        match fs::metadata(&manifest.path) {
            Ok(meta) => {
                manifest.modified = meta.modified().ok();
                manifest.on_disk_len = Some(meta.len());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ManifestError::io(&manifest.path, e)),
        }
        Ok(manifest)
    }

    /// Load a manifest from disk.
    ///
    /// A missing file yields an empty manifest. Unparseable lines are
    /// returned as warnings; the remaining lines are kept.
    pub fn load(
        path: impl Into<PathBuf>,
        digest_len: usize,
    ) -> Result<(Self, Vec<ManifestError>), ManifestError> {
        let mut manifest = Self::stat(path)?;
        if manifest.on_disk_len.is_none() {
            return Ok((manifest, Vec::new()));
        }

        let raw = fs::read(&manifest.path).map_err(|e| ManifestError::io(&manifest.path, e))?;
        let parsed = codec::parse(&raw, digest_len);
        debug!(
            manifest = %manifest.path.display(),
            entries = parsed.entries.len(),
            warnings = parsed.warnings.len(),
            "Loaded manifest"
        );
        manifest.entries = parsed.entries;
        Ok((manifest, parsed.warnings))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &BTreeMap<String, Digest> {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn exists(&self) -> bool {
        self.on_disk_len.is_some()
    }

    /// Whether the backing file exists and holds any bytes
    pub fn has_content_on_disk(&self) -> bool {
        self.on_disk_len.map(|len| len > 0).unwrap_or(false)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Insert or replace an entry. Always marks the manifest dirty: a
    /// replacement with an identical digest still refreshes the manifest's
    /// timestamp when persisted.
    pub fn insert(&mut self, name: impl Into<String>, digest: impl Into<Digest>) {
        self.entries.insert(name.into(), digest.into());
        self.dirty = true;
    }

    pub fn remove(&mut self, name: &str) -> Option<Digest> {
        let removed = self.entries.remove(name);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Drop every entry (full rebuild).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty = true;
    }

    /// Atomically rewrite the backing file with the sorted entries.
    ///
    /// The content is written to a temporary file in the same directory and
    /// renamed over the original, so an interrupted write leaves the previous
    /// manifest intact. A read-only manifest is never replaced.
    pub fn persist(&mut self) -> Result<(), ManifestError> {
        let bytes = codec::serialize(&self.entries)?;
        if let Ok(meta) = fs::metadata(&self.path) {
            if meta.permissions().readonly() {
                return Err(ManifestError::io(
                    &self.path,
                    std::io::Error::new(ErrorKind::PermissionDenied, "manifest is read-only"),
                ));
            }
        }
        let parent = self
            .path
            .parent()
            .ok_or_else(|| {
                ManifestError::io(
                    &self.path,
                    std::io::Error::new(ErrorKind::Other, "manifest has no parent directory"),
                )
            })?
            .to_path_buf();
        let io_err = |e| ManifestError::io(&self.path, e);

        let mut temp = tempfile::Builder::new()
            .prefix(".dirhash-")
            .suffix(".tmp")
            .tempfile_in(&parent)
            .map_err(io_err)?;
        temp.write_all(&bytes).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;

        let permissions = match fs::metadata(&self.path) {
            Ok(meta) => Some(meta.permissions()),
            Err(_) => default_permissions(temp.as_file()),
        };
        if let Some(permissions) = permissions {
            temp.as_file().set_permissions(permissions).map_err(io_err)?;
        }

        temp.persist(&self.path).map_err(|e| io_err(e.error))?;

        let meta = fs::metadata(&self.path).map_err(io_err)?;
        self.modified = meta.modified().ok();
        self.on_disk_len = Some(meta.len());
        self.dirty = false;
        debug!(manifest = %self.path.display(), entries = self.entries.len(), "Persisted manifest");
        Ok(())
    }

    /// Remove the backing file, if any.
    pub fn delete_file(&mut self) -> Result<(), ManifestError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ManifestError::io(&self.path, e)),
        }
        self.on_disk_len = None;
        self.modified = None;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(unix)]
fn default_permissions(file: &fs::File) -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = file.metadata().ok()?.permissions();
    permissions.set_mode(0o644);
    Some(permissions)
}

#[cfg(not(unix))]
fn default_permissions(_file: &fs::File) -> Option<fs::Permissions> {
    None
}
