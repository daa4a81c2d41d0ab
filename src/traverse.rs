//! Traversal driver
//!
//! Walks the tree in pre-order (a directory before its sorted subdirectories),
//! builds one [`DirectoryContext`] per processed directory and hands it to the
//! [`Reconciler`]. Placement of manifests (per directory, per file, per
//! subtree) is resolved here; the engine never sees the difference.

use crate::config::{RunConfig, SubtreeDetection};
use crate::conflict::{ConflictDecision, ConflictResolver, ConflictState, FixedResolver};
use crate::error::{DirhashError, ManifestError};
use crate::events::{Event, EventSink, NullSink, Outcome, SkipReason};
use crate::manifest::{Manifest, ManifestSet};
use crate::reconcile::{DirectoryContext, Reconciler};
use crate::report::{Emitter, Report, Summary};
use crate::tree::path;
use crate::tree::{ContentHasher, IgnoreReason, Listing, Walker};
use crate::types::{FileObservation, Mode, OutcomeKind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

static NULL_SINK: NullSink = NullSink;
static SKIP_RESOLVER: FixedResolver = FixedResolver(ConflictDecision::Skip);

/// One configured run over a tree
pub struct Traversal<'a> {
    config: &'a RunConfig,
    hasher: &'a dyn ContentHasher,
    sink: &'a dyn EventSink,
    resolver: &'a dyn ConflictResolver,
}

/// What the driver does after visiting a directory
enum Flow {
    Descend(Vec<PathBuf>),
    Stop,
}

/// Mutable bookkeeping of one run
struct RunState<'c> {
    conflicts: &'c mut ConflictState,
    /// Processable directories seen so far, including resumed-over ones
    ordinal: usize,
    /// Directories actually reconciled
    processed: usize,
}

/// Files gathered below a subtree root
#[derive(Default)]
struct SubtreeScan {
    files: Vec<FileObservation>,
    ignored: Vec<(PathBuf, IgnoreReason)>,
    invalid: Vec<(PathBuf, ManifestError)>,
    nested: Vec<PathBuf>,
    unreadable: Vec<(PathBuf, String)>,
    /// Key prefixes (`dir/`) of directories the scan did not enter
    unscanned: Vec<String>,
}

impl SubtreeScan {
    fn skip_directory(&mut self, root: &Path, directory: &Path) {
        if let Ok(key) = path::relative_key(root, directory) {
            self.unscanned.push(format!("{}/", key));
        }
    }
}

impl<'a> Traversal<'a> {
    /// A traversal that discards events and skips conflicting manifests
    pub fn new(config: &'a RunConfig, hasher: &'a dyn ContentHasher) -> Self {
        Self {
            config,
            hasher,
            sink: &NULL_SINK,
            resolver: &SKIP_RESOLVER,
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn EventSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_resolver(mut self, resolver: &'a dyn ConflictResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Reconcile every directory below `root`.
    ///
    /// Per-file and per-directory problems become events; only an invalid
    /// root, contradictory configuration or an explicit abort fail the run.
    pub fn run(&self, root: &Path) -> Result<Summary, DirhashError> {
        let mut conflicts = ConflictState::new(self.config.overwrite);
        self.run_with_conflicts(root, &mut conflicts)
    }

    /// Like [`Traversal::run`], but "all" answers recorded in `conflicts`
    /// carry over from earlier roots of the same invocation.
    #[instrument(skip(self, conflicts), fields(mode = %self.config.mode))]
    pub fn run_with_conflicts(
        &self,
        root: &Path,
        conflicts: &mut ConflictState,
    ) -> Result<Summary, DirhashError> {
        self.config.validate()?;
        let root = path::canonicalize_root(root)?;
        let started = Instant::now();

        let report = Report::new();
        let emitter = Emitter::new(&report, self.sink);
        let walker = Walker::new(self.config.walker_config(self.hasher.extension()));
        let reconciler = Reconciler::new(self.config, self.hasher);
        let mut state = RunState {
            conflicts,
            ordinal: 0,
            processed: 0,
        };

        info!(root = %root.display(), "Starting traversal");

        let mut pending = vec![(root.clone(), 0usize)];
        while let Some((directory, depth)) = pending.pop() {
            let flow = self.visit(
                &directory,
                depth,
                directory == root,
                &walker,
                &reconciler,
                &emitter,
                &mut state,
            )?;
            match flow {
                Flow::Descend(subdirectories) => {
                    if self.within_depth(depth) {
                        pending.extend(subdirectories.into_iter().rev().map(|d| (d, depth + 1)));
                    }
                }
                Flow::Stop => {
                    info!(processed = state.processed, "Directory limit reached");
                    break;
                }
            }
        }

        let summary = report.summary(started.elapsed());
        info!(
            directories = summary.directories,
            hashed_files = summary.hashed_files,
            status = ?summary.status,
            "Traversal finished"
        );
        Ok(summary)
    }

    fn within_depth(&self, depth: usize) -> bool {
        self.config.max_depth.map_or(true, |max| depth < max)
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &self,
        directory: &Path,
        depth: usize,
        is_root: bool,
        walker: &Walker,
        reconciler: &Reconciler<'_>,
        emitter: &Emitter<'_>,
        state: &mut RunState<'_>,
    ) -> Result<Flow, DirhashError> {
        let listing = match walker.enumerate(directory) {
            Ok(listing) => listing,
            Err(e) => {
                warn!(directory = %directory.display(), error = %e, "Could not list directory");
                emitter.emit(Event::Outcome(
                    Outcome::new(directory, "", OutcomeKind::Error).with_detail(e.to_string()),
                ));
                return Ok(Flow::Descend(Vec::new()));
            }
        };

        let subtree = self.is_subtree_root(directory, is_root, &listing);
        let Listing {
            files,
            subdirectories,
            manifests,
            ignored,
            invalid,
        } = listing;

        let (scan, subdirectories) = if subtree {
            let scan = self.scan_subtree(
                directory,
                depth,
                walker,
                files,
                subdirectories,
                ignored,
                invalid,
            );
            (scan, Vec::new())
        } else {
            let scan = SubtreeScan {
                files,
                ignored,
                invalid,
                ..SubtreeScan::default()
            };
            (scan, subdirectories)
        };

        let leaf = subdirectories.is_empty();
        let processable = (is_root
            || !scan.files.is_empty()
            || !scan.invalid.is_empty()
            || !manifests.is_empty())
            && (leaf || !self.config.leaves_only);
        if !processable {
            for (path, reason) in scan.ignored {
                emit_ignored(emitter, path, &reason);
            }
            return Ok(Flow::Descend(subdirectories));
        }

        state.ordinal += 1;
        if state.ordinal <= self.config.skip_dirs {
            debug!(directory = %directory.display(), "Skipped to resume");
            emitter.emit(Event::DirectorySkipped {
                directory: directory.to_path_buf(),
                reason: SkipReason::Resume,
            });
            return Ok(Flow::Descend(subdirectories));
        }
        if let Some(max) = self.config.max_dirs {
            if state.processed >= max {
                return Ok(Flow::Stop);
            }
        }
        state.processed += 1;

        emitter.emit(Event::DirectoryStarted {
            directory: directory.to_path_buf(),
            files: scan.files.len(),
            index: state.ordinal,
        });
        for (path, reason) in scan.ignored {
            emit_ignored(emitter, path, &reason);
        }
        for (path, error) in scan.invalid {
            emit_invalid(emitter, &path, &error);
        }
        for (path, message) in scan.unreadable {
            emitter.emit(Event::Outcome(
                Outcome::new(path, "", OutcomeKind::Error).with_detail(message),
            ));
        }
        for nested in scan.nested {
            emitter.emit(Event::DirectorySkipped {
                directory: nested,
                reason: SkipReason::NestedManifest,
            });
        }

        let set = match self.load_set(directory, &manifests) {
            Ok((set, warnings)) => {
                for (manifest, warning) in warnings {
                    warn!(
                        manifest = %manifest.display(),
                        warning = %warning,
                        "Skipped manifest line"
                    );
                    emitter.emit(Event::ManifestWarning {
                        manifest,
                        message: warning.to_string(),
                    });
                }
                set
            }
            Err(e) => {
                warn!(directory = %directory.display(), error = %e, "Could not read manifest");
                let name = manifest_file_name(&e)
                    .unwrap_or_else(|| self.config.manifest_name.clone());
                emitter.emit(Event::Outcome(
                    Outcome::new(directory, name, OutcomeKind::Error).with_detail(e.to_string()),
                ));
                return Ok(Flow::Descend(subdirectories));
            }
        };

        if self.config.mode == Mode::Write {
            let existing = set.non_empty_files();
            if !existing.is_empty() {
                let decision = state.conflicts.decide(self.resolver, &existing);
                emitter.emit(Event::ManifestConflict {
                    manifests: existing,
                    decision,
                });
                if decision == ConflictDecision::Abort {
                    return Err(DirhashError::Aborted(directory.to_path_buf()));
                }
                if !decision.proceeds() {
                    emitter.emit(Event::DirectorySkipped {
                        directory: directory.to_path_buf(),
                        reason: SkipReason::Conflict,
                    });
                    return Ok(Flow::Descend(subdirectories));
                }
            }
        }

        if self.config.mode == Mode::Check
            && self.config.warn_missing_manifest
            && !set.exists_on_disk()
            && !scan.files.is_empty()
        {
            emitter.emit(Event::ManifestAbsent {
                directory: directory.to_path_buf(),
            });
        }

        let mut ctx = DirectoryContext::new(directory, set, scan.files);
        ctx.subdirectories = subdirectories;
        ctx.unscanned = scan.unscanned;
        reconciler.reconcile(&mut ctx, emitter);
        Ok(Flow::Descend(ctx.subdirectories))
    }

    /// Whether `directory`'s manifest governs its whole subtree
    fn is_subtree_root(&self, directory: &Path, is_root: bool, listing: &Listing) -> bool {
        if is_root && self.config.subtree_manifest {
            return true;
        }
        if self.config.subtree_detection != SubtreeDetection::Auto
            || self.config.per_file_manifest
            || listing.manifests.is_empty()
        {
            return false;
        }
        match Manifest::load(directory.join(&self.config.manifest_name), self.hasher.digest_len()) {
            Ok((manifest, _)) => {
                let nested = manifest.entries().keys().any(|key| key.contains('/'));
                if nested {
                    debug!(directory = %directory.display(), "Detected subtree manifest");
                }
                nested
            }
            Err(_) => false,
        }
    }

    /// Enumerate everything below a subtree root within the depth limit.
    /// Keys become `/`-separated paths relative to `root`.
    #[allow(clippy::too_many_arguments)]
    fn scan_subtree(
        &self,
        root: &Path,
        depth: usize,
        walker: &Walker,
        files: Vec<FileObservation>,
        subdirectories: Vec<PathBuf>,
        ignored: Vec<(PathBuf, IgnoreReason)>,
        invalid: Vec<(PathBuf, ManifestError)>,
    ) -> SubtreeScan {
        let mut scan = SubtreeScan {
            files,
            ignored,
            invalid,
            ..SubtreeScan::default()
        };

        let mut pending = Vec::new();
        if self.within_depth(depth) {
            pending.extend(subdirectories.into_iter().rev().map(|d| (d, depth + 1)));
        } else {
            for directory in &subdirectories {
                scan.skip_directory(root, directory);
            }
        }

        while let Some((directory, depth)) = pending.pop() {
            let listing = match walker.enumerate(&directory) {
                Ok(listing) => listing,
                Err(e) => {
                    scan.skip_directory(root, &directory);
                    scan.unreadable.push((directory, e.to_string()));
                    continue;
                }
            };
            if !listing.manifests.is_empty() {
                debug!(directory = %directory.display(), "Nested manifest inside subtree");
                scan.skip_directory(root, &directory);
                scan.nested.push(directory);
                continue;
            }

            for mut file in listing.files {
                match path::relative_key(root, &file.path) {
                    Ok(key) => {
                        file.name = key;
                        scan.files.push(file);
                    }
                    Err(e) => scan.invalid.push((file.path, e)),
                }
            }
            scan.ignored.extend(listing.ignored);
            scan.invalid.extend(listing.invalid);

            if self.within_depth(depth) {
                pending.extend(listing.subdirectories.into_iter().rev().map(|d| (d, depth + 1)));
            } else {
                for subdirectory in &listing.subdirectories {
                    scan.skip_directory(root, subdirectory);
                }
            }
        }

        scan.files.sort_by(|a, b| a.name.cmp(&b.name));
        scan
    }

    /// Load (or, in write mode, only stat) the manifests of a directory
    fn load_set(
        &self,
        directory: &Path,
        manifests: &[String],
    ) -> Result<(ManifestSet, Vec<(PathBuf, ManifestError)>), ManifestError> {
        let digest_len = self.hasher.digest_len();
        let write = self.config.mode == Mode::Write;

        if self.config.per_file_manifest {
            let extension = self.hasher.extension();
            return if write {
                Ok((ManifestSet::stat_per_file(directory, manifests, extension)?, Vec::new()))
            } else {
                ManifestSet::load_per_file(directory, manifests, extension, digest_len)
            };
        }

        let path = directory.join(&self.config.manifest_name);
        if write {
            return Ok((ManifestSet::shared(Manifest::stat(path)?), Vec::new()));
        }
        let (manifest, warnings) = Manifest::load(&path, digest_len)?;
        let warnings = warnings.into_iter().map(|w| (path.clone(), w)).collect();
        Ok((ManifestSet::shared(manifest), warnings))
    }
}

fn emit_ignored(emitter: &Emitter<'_>, path: PathBuf, reason: &IgnoreReason) {
    debug!(path = %path.display(), reason = %reason, "Ignored entry");
    emitter.emit(Event::Ignored {
        path,
        reason: reason.to_string(),
    });
}

fn emit_invalid(emitter: &Emitter<'_>, path: &Path, error: &ManifestError) {
    warn!(path = %path.display(), error = %error, "Filename cannot be recorded");
    let directory = path.parent().unwrap_or(path);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    emitter.emit(Event::Outcome(
        Outcome::new(directory, name, OutcomeKind::Error).with_detail(error.to_string()),
    ));
}

fn manifest_file_name(error: &ManifestError) -> Option<String> {
    match error {
        ManifestError::Io { path, .. } => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        _ => None,
    }
}
