//! Interactive answer to manifest overwrite conflicts

use crate::conflict::{ConflictDecision, ConflictResolver};
use dialoguer::Select;
use std::path::PathBuf;
use tracing::warn;

const CHOICES: [(&str, ConflictDecision); 5] = [
    ("Overwrite", ConflictDecision::Overwrite),
    ("Overwrite all", ConflictDecision::OverwriteAll),
    ("Skip", ConflictDecision::Skip),
    ("Skip all", ConflictDecision::SkipAll),
    ("Abort", ConflictDecision::Abort),
];

/// Asks on the terminal; falls back to skipping if the prompt fails
#[derive(Debug, Default)]
pub struct PromptResolver;

impl ConflictResolver for PromptResolver {
    fn resolve(&self, manifests: &[PathBuf]) -> ConflictDecision {
        let names: Vec<String> = manifests.iter().map(|m| m.display().to_string()).collect();
        let items: Vec<&str> = CHOICES.iter().map(|(label, _)| *label).collect();

        let selection = Select::new()
            .with_prompt(format!("Existing checksums in {}", names.join(", ")))
            .items(&items)
            .default(2)
            .interact();

        match selection {
            Ok(index) => CHOICES
                .get(index)
                .map(|(_, decision)| *decision)
                .unwrap_or(ConflictDecision::Skip),
            Err(e) => {
                warn!(error = %e, "Conflict prompt failed, skipping");
                ConflictDecision::Skip
            }
        }
    }
}
