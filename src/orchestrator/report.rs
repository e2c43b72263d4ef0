// src/orchestrator/report.rs

//! Per-attempt, per-archive and per-run results
//!
//! These are plain values handed back by the orchestrator and the batch
//! runner; nothing here is global.

use std::path::PathBuf;

use super::OrchestratorState;

/// What happened when one strategy was tried on one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The pipeline completed and the archive was replaced
    Succeeded {
        previous: Option<String>,
        current: String,
    },
    /// The pipeline ran and failed at some stage
    Failed(String),
    /// The strategy never ran (missing tool, layout not applicable)
    Skipped(String),
}

/// One (strategy, outcome) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineAttempt {
    pub strategy: String,
    pub outcome: AttemptOutcome,
}

impl PipelineAttempt {
    pub fn new(strategy: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            strategy: strategy.into(),
            outcome,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Succeeded { .. })
    }

    /// True when the strategy actually ran, whatever the result
    pub fn ran(&self) -> bool {
        !matches!(self.outcome, AttemptOutcome::Skipped(_))
    }
}

/// Everything the orchestrator learned about one archive
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub archive: PathBuf,
    pub file_name: String,
    pub attempts: Vec<PipelineAttempt>,
    pub state: OrchestratorState,
}

impl ArchiveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.state, OrchestratorState::Succeeded { .. })
    }

    /// Exhausted only because no strategy could find the manifest
    pub fn is_manifest_missing(&self) -> bool {
        matches!(
            self.state,
            OrchestratorState::Exhausted {
                manifest_missing: true,
                ..
            }
        )
    }

    /// Strategies that actually ran, in order
    pub fn strategies_tried(&self) -> impl Iterator<Item = &str> {
        self.attempts
            .iter()
            .filter(|a| a.ran())
            .map(|a| a.strategy.as_str())
    }
}

/// Tally for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Archives without any manifest; counted apart from `failed`
    pub skipped: usize,
}

impl RunReport {
    pub fn record(&mut self, outcome: &ArchiveOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else if outcome.is_manifest_missing() {
            self.skipped += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Archives that did not end up patched
    pub fn unpatched(&self) -> usize {
        self.failed + self.skipped
    }
}
