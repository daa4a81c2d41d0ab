//! Logging System
//!
//! Structured logging using the `tracing` crate. Diagnostics go to stderr by
//! default so that stdout carries only the run report.

use crate::error::DirhashError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether to install a subscriber at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stderr, stdout, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (required when output is "file")
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, terminal destinations only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. Environment variables (DIRHASH_LOG, DIRHASH_LOG_FORMAT, DIRHASH_LOG_OUTPUT)
/// 2. The given configuration (file values with CLI flags applied)
/// 3. Defaults
pub fn init_logging(config: &LoggingConfig) -> Result<(), DirhashError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;

    let (writer, ansi) = match output {
        Output::Stderr => (BoxMakeWriter::new(std::io::stderr), config.color),
        Output::Stdout => (BoxMakeWriter::new(std::io::stdout), config.color),
        Output::File => {
            let path = config.file.clone().ok_or_else(|| {
                DirhashError::ConfigError("Log output 'file' requires a log file path".to_string())
            })?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DirhashError::ConfigError(format!("Failed to create log directory: {}", e))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    DirhashError::ConfigError(format!("Failed to open log file {:?}: {}", path, e))
                })?;
            (BoxMakeWriter::new(std::sync::Mutex::new(file)), false)
        }
    };

    let layer = if format == "json" {
        fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed()
    };

    Registry::default()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| DirhashError::ConfigError(format!("Failed to install logger: {}", e)))
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, DirhashError> {
    if let Ok(filter) = EnvFilter::try_from_env("DIRHASH_LOG") {
        return Ok(filter);
    }

    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);

    for (module, module_level) in &config.modules {
        let directive = format!("{}={}", module, module_level);
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| DirhashError::ConfigError(format!("Invalid log directive: {}", e)))?,
        );
    }

    if let Ok(modules_str) = std::env::var("DIRHASH_LOG_MODULES") {
        for module_spec in modules_str.split(',') {
            let parts: Vec<&str> = module_spec.split('=').collect();
            if parts.len() == 2 {
                let directive = format!("{}={}", parts[0].trim(), parts[1].trim());
                filter = filter.add_directive(directive.parse().map_err(|e| {
                    DirhashError::ConfigError(format!("Invalid log directive from env: {}", e))
                })?);
            }
        }
    }

    Ok(filter)
}

/// Determine output format from config or environment
fn determine_format(config: &LoggingConfig) -> Result<String, DirhashError> {
    if let Ok(format) = std::env::var("DIRHASH_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }

    let format = config.format.as_str();
    if format != "json" && format != "text" {
        return Err(DirhashError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }

    Ok(format.to_string())
}

/// Output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stderr,
    Stdout,
    File,
}

fn determine_output(config: &LoggingConfig) -> Result<Output, DirhashError> {
    if let Ok(output) = std::env::var("DIRHASH_LOG_OUTPUT") {
        return parse_output(&output);
    }
    parse_output(&config.output)
}

fn parse_output(output: &str) -> Result<Output, DirhashError> {
    match output {
        "stderr" => Ok(Output::Stderr),
        "stdout" => Ok(Output::Stdout),
        "file" => Ok(Output::File),
        _ => Err(DirhashError::ConfigError(format!(
            "Invalid log output: {} (must be 'stderr', 'stdout' or 'file')",
            output
        ))),
    }
}
