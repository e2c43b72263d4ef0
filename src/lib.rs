// src/lib.rs

//! vsixpatch: retarget VS Code extension packages at a new engine version
//!
//! Rewrites `engines.<platform>` in the `package.json` of VSIX archives and
//! repackages them in place, keeping the original container kind.
//!
//! # Architecture
//!
//! - Classifier: plain ZIP, gzip-wrapped ZIP or unknown, by content
//! - Locator/Patcher: find the manifest in the extracted tree, set one key
//! - Repackager: tree back to ZIP, re-wrap, atomic replace
//! - Orchestrator: ordered strategies, first success wins
//!
//! Failures are per archive. A batch run always finishes and records each
//! result in the success or failure ledger.

pub mod archive;
pub mod compression;
pub mod config;
mod error;
pub mod filesystem;
pub mod ledger;
pub mod manifest;
pub mod orchestrator;
pub mod pipeline;
pub mod strategy;
pub mod tools;

pub use archive::{ContainerKind, classify};
pub use config::PatchConfig;
pub use error::{Error, Result};
pub use manifest::{ManifestSummary, PatchOutcome, patch_engine};
pub use orchestrator::{
    ArchiveOutcome, AttemptOutcome, BatchRunner, Orchestrator, OrchestratorState,
    PipelineAttempt, RunReport,
};
pub use pipeline::{PipelineOptions, run_pipeline};
pub use strategy::{Strategy, StrategyKind};
