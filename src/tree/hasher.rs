//! Content hashing behind a pluggable adapter
//!
//! The reconciliation engine only sees [`ContentHasher`]; swapping the digest
//! algorithm means providing another implementation, nothing else.

use crate::error::HashError;
use crate::types::Digest;
use md5::{Digest as _, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Files are fed to the digest 1 MiB at a time.
const CHUNK_SIZE: usize = 1024 * 1024;

/// A content-hash primitive producing fixed-width lowercase hex digests
pub trait ContentHasher: Send + Sync {
    /// Human-readable algorithm name
    fn name(&self) -> &'static str;

    /// Extension used for per-file manifests (`<file>.<extension>`)
    fn extension(&self) -> &'static str;

    /// Number of hex characters in a digest
    fn digest_len(&self) -> usize;

    /// Digest a byte stream, returning the hex digest and the byte count.
    fn digest_reader(&self, reader: &mut dyn Read) -> io::Result<(Digest, u64)>;
}

/// Default adapter: 128-bit MD5, compatible with `md5sum` manifests
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl ContentHasher for Md5Hasher {
    fn name(&self) -> &'static str {
        "md5"
    }

    fn extension(&self) -> &'static str {
        "md5"
    }

    fn digest_len(&self) -> usize {
        32
    }

    fn digest_reader(&self, reader: &mut dyn Read) -> io::Result<(Digest, u64)> {
        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
            total += read as u64;
        }

        Ok((hex::encode(hasher.finalize()), total))
    }
}

/// Digest of a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub digest: Digest,
    pub bytes: u64,
}

/// Open and hash a file with the given adapter
pub fn hash_file(hasher: &dyn ContentHasher, path: &Path) -> Result<FileDigest, HashError> {
    let to_error = |source| HashError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(to_error)?;
    let (digest, bytes) = hasher.digest_reader(&mut file).map_err(to_error)?;
    Ok(FileDigest { digest, bytes })
}

/// Compute the digest of an in-memory buffer
pub fn hash_bytes(hasher: &dyn ContentHasher, content: &[u8]) -> Digest {
    let mut reader = content;
    // Reading from a slice cannot fail.
    hasher
        .digest_reader(&mut reader)
        .map(|(digest, _)| digest)
        .unwrap_or_default()
}

/// Whether `digest` is a well-formed lowercase hex digest of `len` characters
pub fn is_valid_digest(digest: &str, len: usize) -> bool {
    digest.len() == len
        && digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
