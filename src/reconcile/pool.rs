//! Bounded hashing pool
//!
//! Files of one directory are spread over scoped worker threads. Every result
//! is collected before returning, so the caller persists only after all
//! hashing for the directory is done.

use crate::error::HashError;
use crate::tree::{hash_file, ContentHasher, FileDigest};
use crate::types::FileObservation;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Result of hashing one file, keyed by its manifest key
pub type HashOutcome = (String, Result<FileDigest, HashError>);

/// Hash `files` with at most `workers` threads. Results are sorted by key.
pub fn hash_all(
    hasher: &dyn ContentHasher,
    files: &[&FileObservation],
    workers: usize,
) -> Vec<HashOutcome> {
    let threads = workers.max(1).min(files.len());

    let mut results: Vec<HashOutcome> = if threads <= 1 {
        files
            .iter()
            .map(|file| (file.name.clone(), hash_file(hasher, &file.path)))
            .collect()
    } else {
        let next = AtomicUsize::new(0);
        let collected = Mutex::new(Vec::with_capacity(files.len()));
        thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(file) = files.get(index) else {
                        break;
                    };
                    let result = hash_file(hasher, &file.path);
                    collected.lock().push((file.name.clone(), result));
                });
            }
        });
        collected.into_inner()
    };

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}
