// src/ledger.rs

//! Append-only success and failure ledgers for a batch run
//!
//! Each run writes two text files into the log directory, named after the
//! run timestamp:
//!
//! - `successful_extensions_<ts>.txt`: `<file>: <old> -> <new> (using <strategy>)`
//! - `failed_extensions_<ts>.txt`: `<file>: <description>`
//!
//! Both start with a `# Log generated on <time>` header. Lines are flushed
//! as they are written so an interrupted run still leaves usable ledgers.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::Result;
use crate::orchestrator::{ArchiveOutcome, OrchestratorState};

/// `strftime` format of the run timestamp embedded in file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Placeholder for a compatibility value the manifest did not have
pub const ABSENT_VALUE: &str = "none";

/// Timestamp for a run starting now
pub fn run_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Path of the detailed debug log for a run
pub fn run_log_path(log_dir: &Path, timestamp: &str) -> PathBuf {
    log_dir.join(format!("vsix_update_{}.log", timestamp))
}

/// Separator used when folding a multi-line value into one ledger line
const LINE_JOIN: &str = "; ";

/// Fold `text` onto a single line, dropping blank lines
///
/// Tool stderr and manifest strings may span several lines; every ledger
/// entry must stay on exactly one.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(LINE_JOIN)
}

pub fn success_line(file_name: &str, previous: Option<&str>, current: &str, strategy: &str) -> String {
    format!(
        "{}: {} -> {} (using {})",
        single_line(file_name),
        single_line(previous.unwrap_or(ABSENT_VALUE)),
        single_line(current),
        strategy
    )
}

pub fn failure_line(file_name: &str, description: &str) -> String {
    format!("{}: {}", single_line(file_name), single_line(description))
}

fn open_with_header(path: &Path) -> Result<File> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "# Log generated on {}", Local::now().to_rfc3339())?;
    file.flush()?;
    Ok(file)
}

#[derive(Debug)]
pub struct Ledger {
    success_path: PathBuf,
    failure_path: PathBuf,
    success: File,
    failure: File,
}

impl Ledger {
    /// Create both ledgers for the run identified by `timestamp`
    pub fn create(log_dir: &Path, timestamp: &str) -> Result<Self> {
        fs::create_dir_all(log_dir)?;

        let success_path = log_dir.join(format!("successful_extensions_{}.txt", timestamp));
        let failure_path = log_dir.join(format!("failed_extensions_{}.txt", timestamp));
        let success = open_with_header(&success_path)?;
        let failure = open_with_header(&failure_path)?;

        Ok(Self {
            success_path,
            failure_path,
            success,
            failure,
        })
    }

    pub fn success_path(&self) -> &Path {
        &self.success_path
    }

    pub fn failure_path(&self) -> &Path {
        &self.failure_path
    }

    pub fn record_success(
        &mut self,
        file_name: &str,
        previous: Option<&str>,
        current: &str,
        strategy: &str,
    ) -> Result<()> {
        writeln!(self.success, "{}", success_line(file_name, previous, current, strategy))?;
        self.success.flush()?;
        Ok(())
    }

    pub fn record_failure(&mut self, file_name: &str, description: &str) -> Result<()> {
        writeln!(self.failure, "{}", failure_line(file_name, description))?;
        self.failure.flush()?;
        Ok(())
    }

    /// Append the final result of one archive to the matching ledger
    pub fn record(&mut self, outcome: &ArchiveOutcome) -> Result<()> {
        match &outcome.state {
            OrchestratorState::Succeeded {
                strategy,
                previous,
                current,
            } => self.record_success(&outcome.file_name, previous.as_deref(), current, strategy),
            OrchestratorState::Exhausted { reason, .. } => {
                self.record_failure(&outcome.file_name, reason)
            }
            // The orchestrator never hands back a non-terminal state
            OrchestratorState::Pending(_) => Ok(()),
        }
    }
}
