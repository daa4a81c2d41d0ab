//! Per-mode reconciliation rules

use super::pool::{self, HashOutcome};
use super::DirectoryContext;
use crate::config::RunConfig;
use crate::error::HashError;
use crate::events::{Event, Outcome};
use crate::manifest::PersistAction;
use crate::report::Emitter;
use crate::tree::ContentHasher;
use crate::types::{FileObservation, Mode, OutcomeKind};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, instrument, warn};

/// Applies one mode's rules to a directory
pub struct Reconciler<'a> {
    config: &'a RunConfig,
    hasher: &'a dyn ContentHasher,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a RunConfig, hasher: &'a dyn ContentHasher) -> Self {
        Self { config, hasher }
    }

    /// Reconcile `ctx`, emit its outcomes sorted by key, then persist the
    /// manifest set unless running in check mode.
    #[instrument(skip_all, fields(directory = %ctx.directory.display(), mode = %self.config.mode))]
    pub fn reconcile(&self, ctx: &mut DirectoryContext, emitter: &Emitter<'_>) {
        let mut outcomes = match self.config.mode {
            Mode::Check => self.check(ctx, emitter),
            Mode::Write => self.write(ctx, emitter),
            Mode::Update => self.update(ctx, emitter),
        };

        outcomes.sort_by(|a, b| a.filename.cmp(&b.filename));
        debug!(files = ctx.files.len(), outcomes = outcomes.len(), "Directory reconciled");
        for outcome in outcomes {
            emitter.emit(Event::Outcome(outcome));
        }

        if self.config.mode != Mode::Check {
            self.persist(ctx, emitter);
        }
    }

    fn check(&self, ctx: &DirectoryContext, emitter: &Emitter<'_>) -> Vec<Outcome> {
        let entries = ctx.set.entries();
        let observed = by_key(&ctx.files);
        let mut outcomes = Vec::new();
        let mut to_hash = Vec::new();

        for key in entries.keys() {
            if observed.contains_key(key.as_str()) {
                continue;
            }
            if ctx.is_unscanned(key) {
                outcomes.push(not_scanned(ctx, key));
            } else {
                outcomes.push(Outcome::new(&ctx.directory, key, OutcomeKind::Missing));
            }
        }

        for (key, file) in &observed {
            if !entries.contains_key(*key) {
                outcomes.push(Outcome::new(&ctx.directory, *key, OutcomeKind::Extra));
            } else if self.config.paths_only {
                outcomes.push(
                    Outcome::new(&ctx.directory, *key, OutcomeKind::Verified)
                        .with_detail("name only"),
                );
            } else {
                to_hash.push(*file);
            }
        }

        for (key, result) in self.hash(&to_hash, emitter) {
            let expected = entries.get(&key).map(String::as_str).unwrap_or_default();
            let outcome = match result {
                Ok(found) if found.digest == expected => {
                    Outcome::new(&ctx.directory, key, OutcomeKind::Verified)
                }
                Ok(found) => {
                    debug!(file = %key, expected, found = %found.digest, "Digest mismatch");
                    Outcome::new(&ctx.directory, key, OutcomeKind::Corrupt)
                        .with_detail(format!("expected {}, found {}", expected, found.digest))
                }
                Err(e) => {
                    warn!(file = %key, error = %e, "Could not hash file");
                    hash_failed(&ctx.directory, key, &e)
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    fn write(&self, ctx: &mut DirectoryContext, emitter: &Emitter<'_>) -> Vec<Outcome> {
        ctx.set.clear();

        let files: Vec<&FileObservation> = ctx.files.iter().collect();
        let results = self.hash(&files, emitter);

        results
            .into_iter()
            .map(|(key, result)| match result {
                Ok(found) => {
                    ctx.set.insert(&key, found.digest);
                    Outcome::new(&ctx.directory, key, OutcomeKind::Added)
                }
                Err(e) => {
                    warn!(file = %key, error = %e, "Could not hash file");
                    hash_failed(&ctx.directory, key, &e)
                }
            })
            .collect()
    }

    fn update(&self, ctx: &mut DirectoryContext, emitter: &Emitter<'_>) -> Vec<Outcome> {
        let entries = ctx.set.entries();
        let mut outcomes = Vec::new();
        let mut to_hash = Vec::new();
        let mut stale = Vec::new();

        {
            let observed = by_key(&ctx.files);

            for key in entries.keys() {
                if observed.contains_key(key.as_str()) {
                    continue;
                }
                if ctx.is_unscanned(key) {
                    outcomes.push(not_scanned(ctx, key));
                } else if self.config.delete {
                    ctx.set.remove(key);
                    outcomes.push(Outcome::new(&ctx.directory, key, OutcomeKind::Removed));
                } else {
                    outcomes.push(Outcome::new(&ctx.directory, key, OutcomeKind::Missing));
                }
            }

            for (key, file) in observed {
                if !entries.contains_key(key) {
                    to_hash.push(file);
                } else if is_stale(file.modified, ctx.set.recorded_at(key)) {
                    stale.push(key.to_string());
                    to_hash.push(file);
                } else {
                    outcomes.push(Outcome::new(&ctx.directory, key, OutcomeKind::Skipped));
                }
            }
        }

        debug!(new = to_hash.len() - stale.len(), stale = stale.len(), "Update plan");
        let results: Vec<HashOutcome> = self.hash(&to_hash, emitter);

        for (key, result) in results {
            let outcome = match result {
                Ok(found) => {
                    let kind = match entries.get(&key) {
                        Some(_) => OutcomeKind::Rehashed,
                        None => OutcomeKind::Added,
                    };
                    let changed = entries
                        .get(&key)
                        .map(|previous| *previous != found.digest)
                        .unwrap_or(false);
                    ctx.set.insert(&key, found.digest);
                    let outcome = Outcome::new(&ctx.directory, key, kind);
                    if changed {
                        outcome.with_detail("digest changed")
                    } else {
                        outcome
                    }
                }
                Err(e) => {
                    // An existing entry is kept as it was.
                    warn!(file = %key, error = %e, "Could not hash file");
                    hash_failed(&ctx.directory, key, &e)
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    fn hash(&self, files: &[&FileObservation], emitter: &Emitter<'_>) -> Vec<HashOutcome> {
        let results = pool::hash_all(self.hasher, files, self.config.workers);
        for (_, result) in &results {
            if let Ok(found) = result {
                emitter.hashed(found.bytes);
            }
        }
        results
    }

    fn persist(&self, ctx: &mut DirectoryContext, emitter: &Emitter<'_>) {
        for (manifest, result) in ctx.set.persist() {
            match result {
                Ok(PersistAction::Written { entries }) => {
                    emitter.emit(Event::ManifestWritten { manifest, entries });
                }
                Ok(PersistAction::Removed) => {
                    emitter.emit(Event::ManifestRemoved { manifest });
                }
                Err(e) => {
                    warn!(manifest = %manifest.display(), error = %e, "Could not persist manifest");
                    let name = manifest
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    emitter.emit(Event::Outcome(
                        Outcome::new(&ctx.directory, name, OutcomeKind::Error)
                            .with_detail(e.to_string()),
                    ));
                }
            }
        }
    }
}

fn hash_failed(directory: &Path, key: String, error: &HashError) -> Outcome {
    Outcome::new(directory, key, OutcomeKind::Error).with_detail(error.to_string())
}

/// An entry below a directory the scan did not enter: kept as recorded
fn not_scanned(ctx: &DirectoryContext, key: &str) -> Outcome {
    Outcome::new(&ctx.directory, key, OutcomeKind::Skipped).with_detail("not scanned")
}

fn by_key(files: &[FileObservation]) -> BTreeMap<&str, &FileObservation> {
    files.iter().map(|f| (f.name.as_str(), f)).collect()
}

/// A file is stale only when strictly newer than the manifest recording it.
/// Unknown times count as stale.
fn is_stale(file: Option<SystemTime>, recorded: Option<SystemTime>) -> bool {
    match (file, recorded) {
        (Some(file), Some(recorded)) => file > recorded,
        _ => true,
    }
}
