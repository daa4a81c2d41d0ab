//! CLI domain: parse, route, render and prompt only.
//! No reconciliation logic; the route dispatches to the traversal.

mod output;
mod parse;
mod prompt;
mod render;
mod route;

pub use output::{fatal_exit_code, map_error};
pub use parse::{Cli, Commands, OutputFormat, TargetArgs};
pub use prompt::PromptResolver;
pub use render::{
    format_summary_json, format_summary_text, human_readable_size, Renderer, Verbosity,
};
pub use route::{execute, run_config_for};
