//! Filesystem side of reconciliation
//!
//! Enumeration of directory entries, content hashing and path/key handling.

pub mod hasher;
pub mod path;
pub mod walker;

pub use hasher::{hash_file, ContentHasher, FileDigest, Md5Hasher};
pub use walker::{IgnoreReason, Listing, Walker, WalkerConfig};
