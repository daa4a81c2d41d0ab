//! Run-wide outcome aggregation and exit status derivation

use crate::events::{Event, EventSink};
use crate::types::OutcomeKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process exit status derived from a run's outcomes, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Success,
    /// Missing, extra or corrupt files were found
    VerificationFailed,
    /// Files or manifests could not be read or written
    IoErrors,
    /// The run could not complete (bad root, bad configuration, abort)
    Fatal,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::VerificationFailed => 1,
            ExitStatus::IoErrors => 2,
            ExitStatus::Fatal => 3,
        }
    }
}

/// Counters safe for concurrent increment
#[derive(Debug, Default)]
pub struct Report {
    outcomes: [AtomicU64; OutcomeKind::COUNT],
    directories: AtomicU64,
    directories_skipped: AtomicU64,
    manifests_absent: AtomicU64,
    manifests_written: AtomicU64,
    manifests_removed: AtomicU64,
    warnings: AtomicU64,
    ignored: AtomicU64,
    hashed_files: AtomicU64,
    hashed_bytes: AtomicU64,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: OutcomeKind) {
        self.outcomes[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, kind: OutcomeKind) -> u64 {
        self.outcomes[kind.index()].load(Ordering::Relaxed)
    }

    pub fn add_hashed(&self, bytes: u64) {
        self.hashed_files.fetch_add(1, Ordering::Relaxed);
        self.hashed_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.count(OutcomeKind::Error) > 0 {
            ExitStatus::IoErrors
        } else if OutcomeKind::ALL
            .iter()
            .any(|kind| kind.is_verification_failure() && self.count(*kind) > 0)
        {
            ExitStatus::VerificationFailed
        } else {
            ExitStatus::Success
        }
    }

    pub fn summary(&self, elapsed: Duration) -> Summary {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        Summary {
            verified: self.count(OutcomeKind::Verified),
            missing: self.count(OutcomeKind::Missing),
            extra: self.count(OutcomeKind::Extra),
            corrupt: self.count(OutcomeKind::Corrupt),
            added: self.count(OutcomeKind::Added),
            rehashed: self.count(OutcomeKind::Rehashed),
            skipped: self.count(OutcomeKind::Skipped),
            removed: self.count(OutcomeKind::Removed),
            errors: self.count(OutcomeKind::Error),
            directories: load(&self.directories),
            directories_skipped: load(&self.directories_skipped),
            manifests_absent: load(&self.manifests_absent),
            manifests_written: load(&self.manifests_written),
            manifests_removed: load(&self.manifests_removed),
            warnings: load(&self.warnings),
            ignored: load(&self.ignored),
            hashed_files: load(&self.hashed_files),
            hashed_bytes: load(&self.hashed_bytes),
            elapsed_ms: elapsed.as_millis() as u64,
            status: self.exit_status(),
        }
    }
}

impl EventSink for Report {
    fn emit(&self, event: &Event) {
        let counter = match event {
            Event::Outcome(outcome) => {
                self.record(outcome.kind);
                return;
            }
            Event::DirectoryStarted { .. } => &self.directories,
            Event::DirectorySkipped { .. } => &self.directories_skipped,
            Event::ManifestAbsent { .. } => &self.manifests_absent,
            Event::ManifestWritten { .. } => &self.manifests_written,
            Event::ManifestRemoved { .. } => &self.manifests_removed,
            Event::ManifestWarning { .. } => &self.warnings,
            Event::Ignored { .. } => &self.ignored,
            Event::ManifestConflict { .. } => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Final counters of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub verified: u64,
    pub missing: u64,
    pub extra: u64,
    pub corrupt: u64,
    pub added: u64,
    pub rehashed: u64,
    pub skipped: u64,
    pub removed: u64,
    pub errors: u64,
    pub directories: u64,
    pub directories_skipped: u64,
    pub manifests_absent: u64,
    pub manifests_written: u64,
    pub manifests_removed: u64,
    pub warnings: u64,
    pub ignored: u64,
    pub hashed_files: u64,
    pub hashed_bytes: u64,
    pub elapsed_ms: u64,
    pub status: ExitStatus,
}

impl Summary {
    pub fn count(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::Verified => self.verified,
            OutcomeKind::Missing => self.missing,
            OutcomeKind::Extra => self.extra,
            OutcomeKind::Corrupt => self.corrupt,
            OutcomeKind::Added => self.added,
            OutcomeKind::Rehashed => self.rehashed,
            OutcomeKind::Skipped => self.skipped,
            OutcomeKind::Removed => self.removed,
            OutcomeKind::Error => self.errors,
        }
    }

    /// Fold another root's summary into this one
    pub fn absorb(&mut self, other: &Summary) {
        self.verified += other.verified;
        self.missing += other.missing;
        self.extra += other.extra;
        self.corrupt += other.corrupt;
        self.added += other.added;
        self.rehashed += other.rehashed;
        self.skipped += other.skipped;
        self.removed += other.removed;
        self.errors += other.errors;
        self.directories += other.directories;
        self.directories_skipped += other.directories_skipped;
        self.manifests_absent += other.manifests_absent;
        self.manifests_written += other.manifests_written;
        self.manifests_removed += other.manifests_removed;
        self.warnings += other.warnings;
        self.ignored += other.ignored;
        self.hashed_files += other.hashed_files;
        self.hashed_bytes += other.hashed_bytes;
        self.elapsed_ms += other.elapsed_ms;
        self.status = self.status.max(other.status);
    }

    /// Throughput in MiB/s over the whole run
    pub fn throughput_mib(&self) -> f64 {
        if self.elapsed_ms == 0 {
            return 0.0;
        }
        self.hashed_bytes as f64 / 1_048_576.0 / (self.elapsed_ms as f64 / 1000.0)
    }
}

/// Forwards events to the run's [`Report`] and to an external subscriber
pub struct Emitter<'a> {
    report: &'a Report,
    sink: &'a dyn EventSink,
}

impl<'a> Emitter<'a> {
    pub fn new(report: &'a Report, sink: &'a dyn EventSink) -> Self {
        Self { report, sink }
    }

    pub fn emit(&self, event: Event) {
        self.report.emit(&event);
        self.sink.emit(&event);
    }

    pub fn hashed(&self, bytes: u64) {
        self.report.add_hashed(bytes);
    }
}
