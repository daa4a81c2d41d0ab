//! Dirhash: Checksum Manifest Reconciliation
//!
//! Keeps per-directory checksum manifests in sync with the files they
//! describe: verify a tree against its manifests, rebuild them, or update them
//! incrementally without rehashing unchanged data.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod events;
pub mod logging;
pub mod manifest;
pub mod reconcile;
pub mod report;
pub mod traverse;
pub mod tree;
pub mod types;
