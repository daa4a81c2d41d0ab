//! Config sources: global file, explicit file and environment.

use crate::error::DirhashError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path to the global config file: `<config dir>/dirhash/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("dirhash").join("config.toml"))
}

/// Add the global config file if it exists.
pub fn add_global_file(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match global_config_path() {
        Some(path) if path.exists() => {
            debug!(config_path = %path.display(), "Using global configuration file");
            builder.add_source(File::from(path).format(FileFormat::Toml).required(false))
        }
        _ => builder,
    }
}

/// Add a config file named on the command line. It must exist.
pub fn add_explicit_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, DirhashError> {
    if !path.is_file() {
        return Err(DirhashError::ConfigError(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(true)))
}

/// Add `DIRHASH_<SECTION>__<KEY>` environment overrides,
/// e.g. `DIRHASH_RUN__MODE=update`.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("DIRHASH")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
