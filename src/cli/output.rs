//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::DirhashError;
use crate::report::ExitStatus;

/// Map run errors to a string for CLI output.
pub fn map_error(e: &DirhashError) -> String {
    match e {
        DirhashError::Aborted(path) => format!("Aborted by user at {}", path.display()),
        other => other.to_string(),
    }
}

/// Exit code for a run that failed before producing a summary
pub fn fatal_exit_code() -> i32 {
    ExitStatus::Fatal.code()
}
