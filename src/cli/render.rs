//! Event rendering and the end-of-run summary.
//!
//! The core only emits events; everything about verbosity, color and layout
//! lives here.

use crate::cli::parse::OutputFormat;
use crate::events::{Event, EventSink, Outcome};
use crate::report::{ExitStatus, Summary};
use crate::tree::path::display_relative;
use crate::types::OutcomeKind;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::{OwoColorize, Style};
use std::io::Write;
use std::path::PathBuf;

/// How much the renderer prints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbosity {
    /// Number of `-q` flags
    pub quiet: u8,
    pub verbose: bool,
}

impl Verbosity {
    fn shows(&self, event: &Event) -> bool {
        if self.verbose {
            return true;
        }
        let q = self.quiet;
        match event {
            Event::DirectoryStarted { .. } => q == 0,
            Event::Outcome(outcome) => match outcome.kind {
                OutcomeKind::Verified | OutcomeKind::Skipped => false,
                OutcomeKind::Added | OutcomeKind::Rehashed | OutcomeKind::Removed => q <= 1,
                OutcomeKind::Missing
                | OutcomeKind::Extra
                | OutcomeKind::Corrupt
                | OutcomeKind::Error => q <= 2,
            },
            Event::ManifestWarning { .. } | Event::ManifestAbsent { .. } => q <= 2,
            Event::ManifestConflict { .. }
            | Event::ManifestRemoved { .. }
            | Event::DirectorySkipped { .. } => q <= 1,
            Event::ManifestWritten { .. } | Event::Ignored { .. } => false,
        }
    }
}

/// Prints events to stdout as they arrive
pub struct Renderer {
    format: OutputFormat,
    verbosity: Verbosity,
    color: bool,
    /// Paths are shown relative to this directory
    base: PathBuf,
}

impl Renderer {
    pub fn new(format: OutputFormat, verbosity: Verbosity, color: bool, base: PathBuf) -> Self {
        Self {
            format,
            verbosity,
            color,
            base,
        }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn path(&self, path: &std::path::Path) -> String {
        display_relative(&self.base, path)
    }

    /// Render one event, or `None` when the verbosity hides it
    pub fn format_event(&self, event: &Event) -> Option<String> {
        if !self.verbosity.shows(event) {
            return None;
        }
        if self.format == OutputFormat::Json {
            return serde_json::to_string(event).ok();
        }

        let line = match event {
            Event::DirectoryStarted {
                directory,
                files,
                index,
            } => self.paint(
                &format!("[{}] {} ({} files)", index, self.path(directory), files),
                Style::new().bold(),
            ),
            Event::Outcome(outcome) => self.format_outcome(outcome),
            Event::ManifestWarning { manifest, message } => format!(
                "  {} {}: {}",
                self.paint("warning ", Style::new().yellow()),
                self.path(manifest),
                message
            ),
            Event::ManifestAbsent { directory } => format!(
                "  {} {}",
                self.paint("no manifest", Style::new().yellow()),
                self.path(directory)
            ),
            Event::ManifestConflict {
                manifests,
                decision,
            } => {
                let paths: Vec<String> = manifests.iter().map(|m| self.path(m)).collect();
                format!(
                    "  {} {} ({:?})",
                    self.paint("existing", Style::new().yellow()),
                    paths.join(", "),
                    decision
                )
            }
            Event::ManifestWritten { manifest, entries } => format!(
                "  {} {} ({} entries)",
                self.paint("wrote", Style::new().dimmed()),
                self.path(manifest),
                entries
            ),
            Event::ManifestRemoved { manifest } => format!(
                "  {} {}",
                self.paint("deleted", Style::new().yellow()),
                self.path(manifest)
            ),
            Event::DirectorySkipped { directory, reason } => format!(
                "{} {}: {}",
                self.paint("skipped", Style::new().dimmed()),
                self.path(directory),
                reason
            ),
            Event::Ignored { path, reason } => format!(
                "  {} {} ({})",
                self.paint("ignored ", Style::new().dimmed()),
                self.path(path),
                reason
            ),
        };
        Some(line)
    }

    fn format_outcome(&self, outcome: &Outcome) -> String {
        let style = match outcome.kind {
            OutcomeKind::Verified => Style::new().green(),
            OutcomeKind::Added | OutcomeKind::Rehashed => Style::new().cyan(),
            OutcomeKind::Skipped => Style::new().dimmed(),
            OutcomeKind::Removed | OutcomeKind::Missing | OutcomeKind::Extra => {
                Style::new().yellow()
            }
            OutcomeKind::Corrupt => Style::new().red(),
            OutcomeKind::Error => Style::new().red().bold(),
        };
        let label = self.paint(&format!("{:<8}", outcome.kind.as_str()), style);
        let name = if outcome.filename.is_empty() {
            self.path(&outcome.directory)
        } else {
            outcome.filename.clone()
        };
        match &outcome.detail {
            Some(detail) => format!("  {} {} ({})", label, name, detail),
            None => format!("  {} {}", label, name),
        }
    }
}

impl EventSink for Renderer {
    fn emit(&self, event: &Event) {
        if let Some(line) = self.format_event(event) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
        }
    }
}

/// Format the run summary as a table
pub fn format_summary_text(summary: &Summary, color: bool) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Result", "Count"]);

    for kind in OutcomeKind::ALL {
        let count = summary.count(kind);
        if count > 0 {
            table.add_row(vec![kind.as_str().to_string(), count.to_string()]);
        }
    }
    let extra_rows = [
        ("directories", summary.directories),
        ("directories skipped", summary.directories_skipped),
        ("without manifest", summary.manifests_absent),
        ("manifests written", summary.manifests_written),
        ("manifests deleted", summary.manifests_removed),
        ("manifest warnings", summary.warnings),
        ("ignored entries", summary.ignored),
    ];
    for (label, count) in extra_rows {
        if count > 0 || label == "directories" {
            table.add_row(vec![label.to_string(), count.to_string()]);
        }
    }

    let mut out = format!("{}\n", table);
    out.push_str(&format!(
        "Hashed {} files ({}) in {:.2}s, {:.1} MiB/s\n",
        summary.hashed_files,
        human_readable_size(summary.hashed_bytes),
        summary.elapsed_ms as f64 / 1000.0,
        summary.throughput_mib()
    ));

    let status = match summary.status {
        ExitStatus::Success => ("OK", Style::new().green().bold()),
        ExitStatus::VerificationFailed => ("VERIFICATION FAILED", Style::new().red().bold()),
        ExitStatus::IoErrors => ("ERRORS", Style::new().red().bold()),
        ExitStatus::Fatal => ("FATAL", Style::new().red().bold()),
    };
    if color {
        out.push_str(&format!("{}\n", status.0.style(status.1)));
    } else {
        out.push_str(&format!("{}\n", status.0));
    }
    out
}

/// Format the run summary as pretty JSON
pub fn format_summary_json(summary: &Summary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

/// Binary-prefixed size, e.g. `1.5 MiB`
pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
