//! Path normalization and manifest key construction

use crate::error::{DirhashError, ManifestError};
use crate::manifest::codec;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Resolve the traversal root to an absolute, symlink-free path.
///
/// Fails with [`DirhashError::RootNotFound`] or [`DirhashError::NotADirectory`];
/// these are the only path problems that abort a run.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, DirhashError> {
    if !path.exists() {
        return Err(DirhashError::RootNotFound(path.to_path_buf()));
    }
    let canonical = dunce::canonicalize(path)?;
    if !canonical.is_dir() {
        return Err(DirhashError::NotADirectory(canonical));
    }
    Ok(canonical)
}

/// Turn a directory entry name into a manifest key.
pub fn name_key(name: &OsStr) -> Result<String, ManifestError> {
    let name = name
        .to_str()
        .ok_or_else(|| ManifestError::InvalidFilename(name.to_string_lossy().into_owned()))?;
    codec::validate_filename(name)?;
    Ok(name.to_string())
}

/// Build the `/`-separated key of `path` relative to `root`.
///
/// Used in subtree mode, where one manifest lists files of every descendant.
pub fn relative_key(root: &Path, path: &Path) -> Result<String, ManifestError> {
    let invalid = || ManifestError::InvalidFilename(path.to_string_lossy().into_owned());
    let relative = path.strip_prefix(root).map_err(|_| invalid())?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(invalid)?),
            _ => return Err(invalid()),
        }
    }
    if parts.is_empty() {
        return Err(invalid());
    }

    let key = parts.join("/");
    codec::validate_filename(&key)?;
    Ok(key)
}

/// Display a path relative to `base` when possible.
pub fn display_relative(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => format!("./{}", rel.display()),
        Err(_) => path.display().to_string(),
    }
}
