// src/orchestrator/batch.rs

//! Batch runs over many archives
//!
//! Archives are processed one at a time in sorted order. A failure on one
//! archive is recorded and the run moves on; nothing in here aborts a
//! batch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use walkdir::WalkDir;

use super::Orchestrator;
use super::report::{ArchiveOutcome, RunReport};
use crate::error::{Error, Result};
use crate::ledger::Ledger;

/// Archive extension picked up when walking directories
pub const ARCHIVE_EXTENSION: &str = "vsix";

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

fn matches_filters(path: &Path, filters: &[String]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    filters.iter().any(|f| name.contains(f.as_str()))
}

/// Expand `inputs` into the sorted, de-duplicated list of archives to patch
///
/// Files are taken as given, directories are walked recursively for
/// `*.vsix`. When `filters` is non-empty only archives whose file name
/// contains one of them are kept.
pub fn collect_archives(inputs: &[PathBuf], filters: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for input in inputs {
        if input.is_file() {
            found.insert(input.clone());
        } else if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(false) {
                let entry = entry.map_err(|e| {
                    Error::Io(e.into_io_error().unwrap_or_else(|| {
                        std::io::Error::other(format!("walk failed under {}", input.display()))
                    }))
                })?;
                if entry.file_type().is_file() && is_archive(entry.path()) {
                    found.insert(entry.into_path());
                }
            }
        } else {
            return Err(Error::InvalidPath(format!(
                "{} does not exist",
                input.display()
            )));
        }
    }

    let total = found.len();
    let selected: Vec<PathBuf> = found
        .into_iter()
        .filter(|p| matches_filters(p, filters))
        .collect();
    debug!("Selected {} of {} archive(s)", selected.len(), total);
    Ok(selected)
}

/// Drives the orchestrator over a list of archives and keeps the ledgers
pub struct BatchRunner {
    orchestrator: Orchestrator,
    ledger: Option<Ledger>,
}

impl BatchRunner {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            ledger: None,
        }
    }

    /// Append every archive result to `ledger`
    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        self.ledger.as_ref()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Process `archives` in order
    ///
    /// `on_archive` is called after each archive with its 1-based position
    /// and its outcome, for progress display.
    pub fn run<F>(&mut self, archives: &[PathBuf], mut on_archive: F) -> RunReport
    where
        F: FnMut(usize, &ArchiveOutcome),
    {
        let mut report = RunReport::default();
        let total = archives.len();

        for (index, archive) in archives.iter().enumerate() {
            let position = index + 1;
            info!("[{}/{}] Processing {}", position, total, archive.display());

            let outcome = self.orchestrator.process(archive);
            report.record(&outcome);

            if let Some(ledger) = self.ledger.as_mut()
                && let Err(e) = ledger.record(&outcome)
            {
                error!("Failed to append {} to ledger: {}", outcome.file_name, e);
            }

            on_archive(position, &outcome);
        }

        info!(
            "Processed {} archive(s): {} updated, {} failed, {} without manifest",
            report.total, report.succeeded, report.failed, report.skipped
        );
        report
    }
}
