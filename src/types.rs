//! Core data types shared by the manifest, reconciliation and traversal layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::SystemTime;

/// Hex-encoded content digest (lowercase).
pub type Digest = String;

/// Operating mode of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Verify files against existing manifests; never writes.
    #[default]
    Check,
    /// Hash everything and rebuild manifests from scratch.
    Write,
    /// Hash only new or stale files; optionally drop dead entries.
    Update,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Check => "check",
            Mode::Write => "write",
            Mode::Update => "update",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "check" => Ok(Mode::Check),
            "write" => Ok(Mode::Write),
            "update" => Ok(Mode::Update),
            other => Err(format!(
                "Invalid mode: {} (must be 'check', 'write' or 'update')",
                other
            )),
        }
    }
}

/// Snapshot of a regular file's metadata taken at enumeration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileObservation {
    /// Manifest key: the basename, or the `/`-separated path relative to a
    /// subtree root.
    pub name: String,
    /// Absolute path used to open the file
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Per-file (or per-directory) result of reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Verified,
    Missing,
    Extra,
    Corrupt,
    Added,
    Rehashed,
    Skipped,
    Removed,
    Error,
}

impl OutcomeKind {
    pub const COUNT: usize = 9;

    pub const ALL: [OutcomeKind; Self::COUNT] = [
        OutcomeKind::Verified,
        OutcomeKind::Missing,
        OutcomeKind::Extra,
        OutcomeKind::Corrupt,
        OutcomeKind::Added,
        OutcomeKind::Rehashed,
        OutcomeKind::Skipped,
        OutcomeKind::Removed,
        OutcomeKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Verified => "verified",
            OutcomeKind::Missing => "missing",
            OutcomeKind::Extra => "extra",
            OutcomeKind::Corrupt => "corrupt",
            OutcomeKind::Added => "added",
            OutcomeKind::Rehashed => "rehashed",
            OutcomeKind::Skipped => "skipped",
            OutcomeKind::Removed => "removed",
            OutcomeKind::Error => "error",
        }
    }

    /// Outcomes that mean the tree does not match its manifests.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            OutcomeKind::Missing | OutcomeKind::Extra | OutcomeKind::Corrupt
        )
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
