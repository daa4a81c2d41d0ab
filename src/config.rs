//! Configuration System
//!
//! One immutable [`RunConfig`] is built per run and handed to every component.
//! Layering (lowest to highest precedence): built-in defaults, the global
//! config file, an explicit `--config` file, `DIRHASH_*` environment variables,
//! and finally command-line flags applied by the CLI.

use crate::error::DirhashError;
use crate::logging::LoggingConfig;
use crate::manifest::DEFAULT_MANIFEST_NAME;
use crate::tree::WalkerConfig;
use crate::types::Mode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

mod defaults;
mod sources;

/// How subtree roots are recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtreeDetection {
    /// Only `subtree_manifest = true` makes the traversal root a subtree root.
    #[default]
    Explicit,
    /// Additionally treat any directory whose manifest lists nested paths as
    /// a subtree root.
    Auto,
}

/// Settings consumed by the traversal and reconciliation core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Shared manifest filename
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,

    #[serde(default)]
    pub mode: Mode,

    /// Compare names only, never hash (check mode)
    #[serde(default)]
    pub paths_only: bool,

    /// Drop entries whose file is gone (update mode)
    #[serde(default)]
    pub delete: bool,

    /// Give every file its own `<file>.<ext>` manifest
    #[serde(default)]
    pub per_file_manifest: bool,

    /// One manifest at the traversal root governs the whole tree
    #[serde(default)]
    pub subtree_manifest: bool,

    #[serde(default)]
    pub subtree_detection: SubtreeDetection,

    /// Skip directories that have subdirectories of their own
    #[serde(default)]
    pub leaves_only: bool,

    /// Maximum descent below the root (0 = root only, None = unbounded)
    #[serde(default)]
    pub max_depth: Option<usize>,

    #[serde(default)]
    pub include_hidden: bool,

    #[serde(default)]
    pub follow_symlinks: bool,

    /// Overwrite non-empty manifests in write mode without asking
    #[serde(default)]
    pub overwrite: bool,

    /// Hashing threads per directory
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Number of processable directories to skip (resume support)
    #[serde(default)]
    pub skip_dirs: usize,

    /// Stop after this many processable directories
    #[serde(default)]
    pub max_dirs: Option<usize>,

    /// Report directories with files but no manifest in check mode
    #[serde(default = "default_true")]
    pub warn_missing_manifest: bool,
}

fn default_manifest_name() -> String {
    DEFAULT_MANIFEST_NAME.to_string()
}

pub(crate) fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(4))
        .unwrap_or(1)
}

fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            manifest_name: default_manifest_name(),
            mode: Mode::default(),
            paths_only: false,
            delete: false,
            per_file_manifest: false,
            subtree_manifest: false,
            subtree_detection: SubtreeDetection::default(),
            leaves_only: false,
            max_depth: None,
            include_hidden: false,
            follow_symlinks: false,
            overwrite: false,
            workers: default_workers(),
            skip_dirs: 0,
            max_dirs: None,
            warn_missing_manifest: true,
        }
    }
}

impl RunConfig {
    /// Defaults for the given mode
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Reject contradictory settings. These are the only configuration
    /// problems that abort a run.
    pub fn validate(&self) -> Result<(), DirhashError> {
        let conflict = |msg: &str| Err(DirhashError::ConfigConflict(msg.to_string()));

        let name = self.manifest_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(&['/', '\\'][..]) {
            return conflict("manifest name must be a plain filename");
        }
        if self.subtree_manifest && self.per_file_manifest {
            return conflict("subtree manifest and per-file manifests are mutually exclusive");
        }
        if self.per_file_manifest && self.subtree_detection == SubtreeDetection::Auto {
            return conflict("subtree auto-detection requires shared manifests");
        }
        if self.paths_only && self.mode != Mode::Check {
            return conflict("paths-only comparison is only available in check mode");
        }
        if self.delete && self.mode != Mode::Update {
            return conflict("deleting dead entries is only available in update mode");
        }
        if self.workers == 0 {
            return conflict("at least one hashing worker is required");
        }
        Ok(())
    }

    /// Enumerator settings derived from this configuration
    pub fn walker_config(&self, hash_extension: &str) -> WalkerConfig {
        WalkerConfig {
            manifest_name: self.manifest_name.clone(),
            per_file_extension: self
                .per_file_manifest
                .then(|| hash_extension.to_string()),
            include_hidden: self.include_hidden,
            follow_symlinks: self.follow_symlinks,
        }
    }
}

/// Root configuration structure (the on-disk config file layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirhashConfig {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Loads [`DirhashConfig`] from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Path of the user-level config file, if a home directory is known
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_config_path()
    }

    /// Load defaults, global file, optional explicit file and environment.
    pub fn load(explicit: Option<&Path>) -> Result<DirhashConfig, DirhashError> {
        let mut builder = defaults::builder_with_defaults()?;
        builder = sources::add_global_file(builder);
        if let Some(path) = explicit {
            builder = sources::add_explicit_file(builder, path)?;
        }
        builder = sources::add_environment(builder);

        let config: DirhashConfig = builder.build()?.try_deserialize()?;
        debug!(
            mode = %config.run.mode,
            manifest = %config.run.manifest_name,
            "Configuration loaded"
        );
        Ok(config)
    }
}
