//! CLI parse: clap types for dirhash. No behavior; definitions only.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Dirhash CLI - checksum manifests for directory trees
#[derive(Parser, Debug)]
#[command(name = "dirhash", version)]
#[command(about = "Create, verify and incrementally update per-directory checksum manifests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Less output: -q hides directory lines, -qq shows only problems,
    /// -qqq shows only the summary. Also disables logging.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Show every outcome and enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Never color the report (also honored: the NO_COLOR variable)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (when log output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    /// One JSON object per event, then the summary
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify files against their manifests (read-only)
    Check {
        #[command(flatten)]
        target: TargetArgs,

        /// Compare file names only, never hash
        #[arg(short, long)]
        paths_only: bool,

        /// Do not report directories without a manifest
        #[arg(long)]
        no_missing_checksums: bool,
    },
    /// Hash every file and rebuild manifests from scratch
    Write {
        #[command(flatten)]
        target: TargetArgs,

        /// Overwrite existing manifests without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Hash new and modified files only
    Update {
        #[command(flatten)]
        target: TargetArgs,

        /// Drop entries whose file no longer exists
        #[arg(short, long)]
        delete: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Options shared by the check, write and update commands
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Directories to process
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Manifest filename
    #[arg(short = 'n', long)]
    pub manifest_name: Option<String>,

    /// One manifest per file (<file>.md5)
    #[arg(long, conflicts_with = "subtree")]
    pub per_file: bool,

    /// One manifest at each root path governs its whole tree
    #[arg(long)]
    pub subtree: bool,

    /// Treat directories whose manifest lists nested paths as subtree roots
    #[arg(long, conflicts_with = "per_file")]
    pub detect_subtrees: bool,

    /// Only directories without subdirectories get a manifest
    #[arg(long)]
    pub leaves_only: bool,

    /// Maximum recursion depth (0 = root directory only)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Include hidden files and directories
    #[arg(short, long)]
    pub all: bool,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    pub follow_links: bool,

    /// Hashing threads
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Skip the first N directories (resume an interrupted run)
    #[arg(long)]
    pub skip: Option<usize>,

    /// Stop after N directories
    #[arg(long)]
    pub limit: Option<usize>,
}
