// src/commands/progress.rs
//! Progress display for batch patch runs
//!
//! An overall bar counts processed archives; the status line below it
//! shows the running success/failure tally and the archive just handled.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Phases shown on the status line
#[derive(Debug, Clone)]
pub enum PatchPhase {
    Patched(String),
    Failed(String),
}

/// Progress tracker for a batch of archives
pub struct BatchProgress {
    _multi: MultiProgress,
    overall: ProgressBar,
    status: ProgressBar,
    succeeded: u64,
    failed: u64,
}

impl BatchProgress {
    /// Create a tracker for `total` archives; `hidden` suppresses all drawing
    pub fn new(total: u64, hidden: bool) -> Self {
        let multi = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let overall = ProgressBar::new(total);
        overall.set_style(
            ProgressStyle::default_bar()
                .template("{msg} ({pos}/{len}) [{bar:40.green/dim}] {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        overall.set_message("Patching");

        let status = ProgressBar::new_spinner();
        status.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        if !hidden {
            status.enable_steady_tick(Duration::from_millis(100));
        }

        let overall = multi.add(overall);
        let status = multi.add(status);

        Self {
            _multi: multi,
            overall,
            status,
            succeeded: 0,
            failed: 0,
        }
    }

    /// Record one finished archive and advance the bar
    pub fn advance(&mut self, position: u64, phase: PatchPhase) {
        let last = match phase {
            PatchPhase::Patched(name) => {
                self.succeeded += 1;
                format!("{} [done]", name)
            }
            PatchPhase::Failed(name) => {
                self.failed += 1;
                format!("{} [FAILED]", name)
            }
        };
        self.overall.set_position(position);
        self.status.set_message(format!(
            "Success: {} | Failed: {} | {}",
            self.succeeded, self.failed, last
        ));
    }

    pub fn finish(&self, message: &str) {
        self.status.finish_and_clear();
        self.overall.finish_with_message(message.to_string());
    }
}
