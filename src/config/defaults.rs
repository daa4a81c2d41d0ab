//! Merge rules: built-in defaults beneath every other source.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with the defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("run.manifest_name", crate::manifest::DEFAULT_MANIFEST_NAME)?
        .set_default("run.mode", "check")?
        .set_default("run.workers", super::default_workers() as i64)?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
