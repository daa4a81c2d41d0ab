//! CLI route: turns a parsed command into a run configuration and dispatches
//! it to the traversal. Rendering stays in `render`.

use crate::cli::parse::{Cli, Commands, OutputFormat, TargetArgs};
use crate::cli::prompt::PromptResolver;
use crate::cli::render::{format_summary_json, format_summary_text, Renderer, Verbosity};
use crate::config::{DirhashConfig, RunConfig, SubtreeDetection};
use crate::conflict::{ConflictResolver, ConflictState, FixedResolver};
use crate::error::DirhashError;
use crate::report::Summary;
use crate::traverse::Traversal;
use crate::tree::Md5Hasher;
use crate::types::Mode;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;

/// Apply a command's flags on top of the loaded run configuration.
///
/// Returns `None` for commands that do not traverse.
pub fn run_config_for(command: &Commands, base: &RunConfig) -> Option<RunConfig> {
    let mut config = base.clone();
    let target = match command {
        Commands::Check {
            target,
            paths_only,
            no_missing_checksums,
        } => {
            config.mode = Mode::Check;
            config.paths_only |= *paths_only;
            config.delete = false;
            if *no_missing_checksums {
                config.warn_missing_manifest = false;
            }
            target
        }
        Commands::Write { target, force } => {
            config.mode = Mode::Write;
            config.paths_only = false;
            config.delete = false;
            config.overwrite |= *force;
            target
        }
        Commands::Update { target, delete } => {
            config.mode = Mode::Update;
            config.paths_only = false;
            config.delete |= *delete;
            target
        }
        Commands::Config => return None,
    };
    apply_target(&mut config, target);
    Some(config)
}

fn apply_target(config: &mut RunConfig, target: &TargetArgs) {
    if let Some(ref name) = target.manifest_name {
        config.manifest_name = name.clone();
    }
    if target.per_file {
        config.per_file_manifest = true;
    }
    if target.subtree {
        config.subtree_manifest = true;
    }
    if target.detect_subtrees {
        config.subtree_detection = SubtreeDetection::Auto;
    }
    if target.leaves_only {
        config.leaves_only = true;
    }
    if target.max_depth.is_some() {
        config.max_depth = target.max_depth;
    }
    if target.all {
        config.include_hidden = true;
    }
    if target.follow_links {
        config.follow_symlinks = true;
    }
    if let Some(workers) = target.workers {
        config.workers = workers;
    }
    if let Some(skip) = target.skip {
        config.skip_dirs = skip;
    }
    if target.limit.is_some() {
        config.max_dirs = target.limit;
    }
}

/// Colors only for a text report on a terminal, and never when disabled
fn use_color(format: OutputFormat, disabled: bool, terminal: bool) -> bool {
    format == OutputFormat::Text && terminal && !disabled
}

/// Execute the parsed command. Returns the process exit code.
pub fn execute(cli: &Cli, config: &DirhashConfig) -> Result<i32, DirhashError> {
    let run_config = match run_config_for(&cli.command, &config.run) {
        Some(run_config) => run_config,
        None => {
            let rendered = toml::to_string_pretty(config).map_err(|e| {
                DirhashError::ConfigError(format!("Failed to render config: {}", e))
            })?;
            print!("{}", rendered);
            return Ok(0);
        }
    };
    run_config.validate()?;

    let paths = match &cli.command {
        Commands::Check { target, .. }
        | Commands::Write { target, .. }
        | Commands::Update { target, .. } => target.paths.clone(),
        Commands::Config => Vec::new(),
    };

    let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    let color = use_color(
        cli.format,
        cli.no_color || no_color_env,
        std::io::stdout().is_terminal(),
    );
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let renderer = Renderer::new(
        cli.format,
        Verbosity {
            quiet: cli.quiet,
            verbose: cli.verbose,
        },
        color,
        base,
    );

    let interactive = cli.format == OutputFormat::Text && std::io::stdin().is_terminal();
    let prompt = PromptResolver;
    let fixed = FixedResolver::default();
    let resolver: &dyn ConflictResolver = if interactive { &prompt } else { &fixed };

    let hasher = Md5Hasher;
    let mut conflicts = ConflictState::new(run_config.overwrite);
    let mut total: Option<Summary> = None;
    for path in &paths {
        info!(root = %path.display(), mode = %run_config.mode, "Processing root");
        let summary = Traversal::new(&run_config, &hasher)
            .with_sink(&renderer)
            .with_resolver(resolver)
            .run_with_conflicts(path, &mut conflicts)?;
        total = Some(match total.take() {
            Some(mut combined) => {
                combined.absorb(&summary);
                combined
            }
            None => summary,
        });
    }

    let Some(summary) = total else {
        return Ok(0);
    };
    match cli.format {
        OutputFormat::Text => print!("{}", format_summary_text(&summary, color)),
        OutputFormat::Json => {
            let json = format_summary_json(&summary).map_err(|e| {
                DirhashError::ConfigError(format!("Failed to render summary: {}", e))
            })?;
            println!("{}", json);
        }
    }
    Ok(summary.status.code())
}
