// src/orchestrator/mod.rs

//! Fallback orchestration over an ordered strategy list
//!
//! For each archive the orchestrator walks its strategies in order, running
//! the full pipeline with each until one succeeds. The first success is
//! final; later strategies are never run. Strategies mutate the archive in
//! place, so attempts are strictly sequential.
//!
//! ```text
//! Pending(0) -> Pending(1) -> ... -> Succeeded { .. }
//!                                \-> Exhausted { .. }
//! ```

pub mod batch;
pub mod report;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::pipeline::{self, PipelineOptions};
use crate::strategy::{self, Strategy, StrategyKind};
use crate::tools::{Capabilities, ToolRunner};

pub use batch::{BatchRunner, collect_archives};
pub use report::{ArchiveOutcome, AttemptOutcome, PipelineAttempt, RunReport};

/// Failure description when no strategy got as far as running
pub const NO_APPLICABLE_STRATEGY: &str = "No applicable strategy";

/// Where an archive is in the fallback sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Next strategy to try
    Pending(usize),
    /// A strategy completed the pipeline
    Succeeded {
        strategy: String,
        previous: Option<String>,
        current: String,
    },
    /// Every strategy failed or was skipped
    Exhausted {
        /// Error of the last strategy that ran, or [`NO_APPLICABLE_STRATEGY`]
        reason: String,
        /// Every strategy that ran failed to find a manifest
        manifest_missing: bool,
    },
}

impl OrchestratorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

/// Runs the fallback sequence for single archives
pub struct Orchestrator {
    strategies: Vec<Box<dyn Strategy>>,
    capabilities: Capabilities,
    options: PipelineOptions,
}

impl Orchestrator {
    /// Use an explicit strategy list and capability set
    pub fn new(
        strategies: Vec<Box<dyn Strategy>>,
        capabilities: Capabilities,
        options: PipelineOptions,
    ) -> Self {
        Self {
            strategies,
            capabilities,
            options,
        }
    }

    /// Build the built-in strategies for `kinds` and probe PATH once for
    /// every tool they need
    pub fn from_kinds(kinds: &[StrategyKind], runner: ToolRunner, options: PipelineOptions) -> Self {
        let strategies = strategy::build_all(kinds, runner);
        let capabilities = Capabilities::probe(
            strategies
                .iter()
                .flat_map(|s| s.required_tools().iter().copied()),
        );
        Self::new(strategies, capabilities, options)
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the fallback sequence on one archive
    ///
    /// Never returns an error: every failure is captured in the outcome.
    pub fn process(&self, archive: &Path) -> ArchiveOutcome {
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| archive.display().to_string());

        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut last_error: Option<String> = None;
        let mut ran_any = false;
        let mut all_manifest_missing = true;

        let mut state = OrchestratorState::Pending(0);
        let state = loop {
            state = match state {
                OrchestratorState::Pending(index) if index >= self.strategies.len() => {
                    OrchestratorState::Exhausted {
                        reason: last_error
                            .take()
                            .unwrap_or_else(|| NO_APPLICABLE_STRATEGY.to_string()),
                        manifest_missing: ran_any && all_manifest_missing,
                    }
                }
                OrchestratorState::Pending(index) => {
                    let strategy = self.strategies[index].as_ref();

                    if let Some(tool) = self.capabilities.missing(strategy.required_tools()) {
                        debug!("{}: skipping {}, {} not on PATH", file_name, strategy.name(), tool);
                        attempts.push(PipelineAttempt::new(
                            strategy.name(),
                            AttemptOutcome::Skipped(format!("{} not found on PATH", tool)),
                        ));
                        OrchestratorState::Pending(index + 1)
                    } else {
                        debug!("{}: trying {}", file_name, strategy.name());
                        match pipeline::run_pipeline(strategy, archive, &self.options) {
                            Ok(outcome) => {
                                attempts.push(PipelineAttempt::new(
                                    strategy.name(),
                                    AttemptOutcome::Succeeded {
                                        previous: outcome.previous.clone(),
                                        current: outcome.current.clone(),
                                    },
                                ));
                                OrchestratorState::Succeeded {
                                    strategy: strategy.name().to_string(),
                                    previous: outcome.previous,
                                    current: outcome.current,
                                }
                            }
                            Err(e) if e.is_skip() => {
                                debug!("{}: {} not applicable: {}", file_name, strategy.name(), e);
                                attempts.push(PipelineAttempt::new(
                                    strategy.name(),
                                    AttemptOutcome::Skipped(e.to_string()),
                                ));
                                OrchestratorState::Pending(index + 1)
                            }
                            Err(e) => {
                                warn!("{}: {} failed: {}", file_name, strategy.name(), e);
                                ran_any = true;
                                all_manifest_missing &= e.is_manifest_missing();
                                last_error = Some(e.to_string());
                                attempts.push(PipelineAttempt::new(
                                    strategy.name(),
                                    AttemptOutcome::Failed(e.to_string()),
                                ));
                                OrchestratorState::Pending(index + 1)
                            }
                        }
                    }
                }
                terminal => terminal,
            };

            if state.is_terminal() {
                break state;
            }
        };

        match &state {
            OrchestratorState::Succeeded { strategy, .. } => {
                info!("{}: patched using {}", file_name, strategy)
            }
            OrchestratorState::Exhausted { reason, .. } => {
                warn!("{}: all strategies exhausted: {}", file_name, reason)
            }
            OrchestratorState::Pending(_) => {}
        }

        ArchiveOutcome {
            archive: archive.to_path_buf(),
            file_name,
            attempts,
            state,
        }
    }
}
