//! Manifest overwrite conflicts
//!
//! Write mode replaces manifests wholesale. When a directory already holds a
//! non-empty manifest the caller decides through a [`ConflictResolver`]
//! before anything is touched, unless overwriting was pre-approved. Either
//! way the conflict is reported.

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDecision {
    Overwrite,
    /// Overwrite this and every later conflict without asking
    OverwriteAll,
    Skip,
    /// Skip this and every later conflict without asking
    SkipAll,
    /// Stop the run
    Abort,
}

impl ConflictDecision {
    pub fn proceeds(&self) -> bool {
        matches!(self, ConflictDecision::Overwrite | ConflictDecision::OverwriteAll)
    }
}

pub trait ConflictResolver {
    /// Decide what to do about the given non-empty manifests.
    fn resolve(&self, manifests: &[PathBuf]) -> ConflictDecision;
}

/// Answers every conflict the same way; the non-interactive default.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub ConflictDecision);

impl Default for FixedResolver {
    fn default() -> Self {
        FixedResolver(ConflictDecision::Skip)
    }
}

impl ConflictResolver for FixedResolver {
    fn resolve(&self, _manifests: &[PathBuf]) -> ConflictDecision {
        self.0
    }
}

/// Sticky answers across one invocation, shared by all of its roots
#[derive(Debug, Default)]
pub struct ConflictState {
    overwrite_all: bool,
    skip_all: bool,
}

impl ConflictState {
    pub fn new(overwrite: bool) -> Self {
        Self {
            overwrite_all: overwrite,
            skip_all: false,
        }
    }

    pub fn decide(
        &mut self,
        resolver: &dyn ConflictResolver,
        manifests: &[PathBuf],
    ) -> ConflictDecision {
        if self.overwrite_all {
            return ConflictDecision::OverwriteAll;
        }
        if self.skip_all {
            return ConflictDecision::SkipAll;
        }
        let decision = resolver.resolve(manifests);
        match decision {
            ConflictDecision::OverwriteAll => self.overwrite_all = true,
            ConflictDecision::SkipAll => self.skip_all = true,
            _ => {}
        }
        decision
    }
}
