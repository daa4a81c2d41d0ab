//! Outcome event stream
//!
//! The core only emits [`Event`]s; rendering, verbosity and counting live in
//! subscribers implementing [`EventSink`].

use crate::conflict::ConflictDecision;
use crate::types::OutcomeKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Result of reconciling one file (or one directory, for manifest errors)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub directory: PathBuf,
    pub filename: String,
    pub kind: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Outcome {
    pub fn new(
        directory: impl Into<PathBuf>,
        filename: impl Into<String>,
        kind: OutcomeKind,
    ) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Why a directory was not reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Manifest overwrite declined
    Conflict,
    /// Holds its own manifest inside a governed subtree
    NestedManifest,
    /// Before the configured resume point
    Resume,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Conflict => f.write_str("existing manifest not overwritten"),
            SkipReason::NestedManifest => f.write_str("nested manifest inside governed subtree"),
            SkipReason::Resume => f.write_str("skipped to resume"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    DirectoryStarted {
        directory: PathBuf,
        files: usize,
        /// 1-based position among processed directories
        index: usize,
    },
    Outcome(Outcome),
    /// A recoverable manifest problem (unparseable line)
    ManifestWarning { manifest: PathBuf, message: String },
    /// Check mode found files but no manifest
    ManifestAbsent { directory: PathBuf },
    ManifestConflict {
        manifests: Vec<PathBuf>,
        decision: ConflictDecision,
    },
    ManifestWritten { manifest: PathBuf, entries: usize },
    ManifestRemoved { manifest: PathBuf },
    DirectorySkipped { directory: PathBuf, reason: SkipReason },
    /// Entry excluded by policy (symlink, special file)
    Ignored { path: PathBuf, reason: String },
}

/// Subscriber to the event stream
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Event) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Event>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Outcome events only, in emission order
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Outcome(outcome) => Some(outcome.clone()),
                _ => None,
            })
            .collect()
    }

    /// Outcome kinds recorded for `filename`
    pub fn kinds_for(&self, filename: &str) -> Vec<OutcomeKind> {
        self.outcomes()
            .into_iter()
            .filter(|o| o.filename == filename)
            .map(|o| o.kind)
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}
