//! Error types for the dirhash checksum manifest system.

use std::path::PathBuf;
use thiserror::Error;

/// Manifest codec and persistence errors
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A manifest line that does not match `<digest><whitespace><filename>`.
    #[error("Line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("Filename cannot be stored in a manifest: {0:?}")]
    InvalidFilename(String),

    #[error("Manifest I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while hashing file content
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory enumeration errors
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("Failed to list directory {path:?}: {message}")]
    ListFailed { path: PathBuf, message: String },
}

/// Run-level errors. Only these abort a traversal; everything else is
/// reported per file or per directory.
#[derive(Debug, Error)]
pub enum DirhashError {
    #[error("Root path does not exist: {0:?}")]
    RootNotFound(PathBuf),

    #[error("Root path is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("Conflicting configuration: {0}")]
    ConfigConflict(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Run aborted at {0:?}")]
    Aborted(PathBuf),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DirhashError {
    fn from(err: config::ConfigError) -> Self {
        DirhashError::ConfigError(err.to_string())
    }
}
