//! Dirhash CLI Binary
//!
//! Command-line interface for creating, verifying and updating checksum
//! manifests.

use anyhow::Context;
use clap::Parser;
use dirhash::cli::{self, Cli};
use dirhash::config::{ConfigLoader, DirhashConfig};
use dirhash::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(cli::fatal_exit_code());
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config: DirhashConfig =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let logging_config = build_logging_config(cli, config.logging.clone());
    init_logging(&logging_config).context("Failed to initialize logging")?;

    info!("Dirhash starting");
    let code = cli::execute(cli, &config).map_err(|e| anyhow::anyhow!(cli::map_error(&e)))?;
    info!(exit_code = code, "Command completed");
    Ok(code)
}

/// Apply logging flags over the configured logging settings.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, mut config: LoggingConfig) -> LoggingConfig {
    if cli.quiet > 0 {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
        if cli.log_output.is_none() {
            config.output = "file".to_string();
        }
    }
    config
}
