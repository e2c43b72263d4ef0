// src/commands/patch.rs

//! Batch patch command
//!
//! Resolves the run configuration, walks the inputs for archives and hands
//! them to the batch runner. Individual archive failures end up in the
//! failure ledger and never change the exit status.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::progress::{BatchProgress, PatchPhase};
use crate::cli::PatchArgs;
use vsixpatch::config::PatchConfig;
use vsixpatch::ledger::{self, Ledger};
use vsixpatch::orchestrator::{BatchRunner, Orchestrator, RunReport, collect_archives};

/// Merge the optional config file with command-line overrides
///
/// Also refuses to continue when a required backup directory is missing,
/// before the run log or any ledger is created.
pub fn resolve_patch_config(args: &PatchArgs) -> Result<PatchConfig> {
    let mut config = match &args.config {
        Some(path) => PatchConfig::load(path)?,
        None => PatchConfig::default(),
    };

    if let Some(target) = &args.target_version {
        config.target_version = target.clone();
    }
    if let Some(platform) = &args.platform {
        config.platform = platform.clone();
    }
    if !args.strategy.is_empty() {
        config.strategies = args.strategy.clone();
    }
    if !args.filter.is_empty() {
        config.targets = args.filter.clone();
    }
    if let Some(dir) = &args.log_dir {
        config.log_dir = dir.clone();
    }
    if let Some(secs) = args.timeout {
        config.tool_timeout_secs = secs;
    }
    if let Some(dir) = &args.backup_dir {
        config.backup_dir = Some(dir.clone());
    }

    config.validate().context("Invalid patch options")?;
    config.check_backup_dir()?;
    Ok(config)
}

/// Patch every archive under `paths`
pub fn cmd_patch(config: &PatchConfig, paths: &[PathBuf], quiet: bool, timestamp: &str) -> Result<()> {
    config.check_backup_dir()?;

    let archives = collect_archives(paths, &config.targets)?;
    if archives.is_empty() {
        println!("No matching VSIX archives found.");
        return Ok(());
    }
    info!(
        "Found {} archive(s); setting engines.{} to {}",
        archives.len(),
        config.platform,
        config.target_version
    );

    let ledger = Ledger::create(&config.log_dir, timestamp).with_context(|| {
        format!("Failed to create ledgers in {}", config.log_dir.display())
    })?;
    let success_path = ledger.success_path().to_path_buf();
    let failure_path = ledger.failure_path().to_path_buf();

    let orchestrator = Orchestrator::from_kinds(
        &config.strategies,
        config.tool_runner(),
        config.pipeline_options(),
    );
    info!("Strategies: {}", orchestrator.strategy_names().join(", "));

    let mut runner = BatchRunner::new(orchestrator).with_ledger(ledger);
    let mut progress = BatchProgress::new(archives.len() as u64, quiet);

    let report = runner.run(&archives, |position, outcome| {
        let phase = if outcome.is_success() {
            PatchPhase::Patched(outcome.file_name.clone())
        } else {
            PatchPhase::Failed(outcome.file_name.clone())
        };
        progress.advance(position as u64, phase);
    });

    progress.finish(&format!("Processed {} archive(s)", report.total));

    print_summary(
        &report,
        &ledger::run_log_path(&config.log_dir, timestamp),
        &success_path,
        &failure_path,
    );
    Ok(())
}

fn print_summary(report: &RunReport, log_path: &Path, success_path: &Path, failure_path: &Path) {
    println!();
    println!("=== Processing Summary ===");
    println!("Total extensions processed: {}", report.total);
    println!("Successfully updated: {}", report.succeeded);
    println!("Failed to update: {}", report.failed);
    println!("Skipped (no manifest): {}", report.skipped);
    println!("Detailed log: {}", log_path.display());
    println!("Successfully updated extensions list: {}", success_path.display());
    println!("Failed extensions list: {}", failure_path.display());
}
