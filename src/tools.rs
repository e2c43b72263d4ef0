// src/tools.rs

//! External tool invocation for the fallback strategies
//!
//! Strategies that shell out to `unzip`, `zip` or `vsce` go through
//! [`ToolRunner`], which bounds every call with a timeout. Tool presence is
//! probed once per run into a [`Capabilities`] set, so a missing tool turns
//! into a skipped strategy instead of a spawn error.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::error::{Error, Result};

/// Default timeout for a single external tool call (2 minutes)
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs external tools with a bounded wait
#[derive(Debug, Clone, Copy)]
pub struct ToolRunner {
    timeout: Duration,
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

impl ToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `program` with `args`, optionally inside `cwd`
    ///
    /// Stdout is discarded and stderr is captured for the error message.
    /// A non-zero exit becomes [`Error::ExternalToolFailed`]; running past
    /// the timeout kills the child and becomes
    /// [`Error::ExternalToolTimeout`].
    pub fn run<S: AsRef<std::ffi::OsStr>>(
        &self,
        program: &str,
        args: &[S],
        cwd: Option<&Path>,
    ) -> Result<()> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        debug!(
            "Executing: {} {:?}",
            program,
            args.iter().map(|a| a.as_ref().to_string_lossy()).collect::<Vec<_>>()
        );

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ExternalToolUnavailable(program.to_string())
            } else {
                Error::Io(e)
            }
        })?;

        // Drain stderr on a separate thread so a chatty tool cannot block
        // on a full pipe while we wait on it.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                warn!("'{}' timed out after {} seconds", program, self.timeout.as_secs());
                return Err(Error::ExternalToolTimeout {
                    tool: program.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        for line in stderr.lines() {
            debug!("[{}] {}", program, line);
        }

        if status.success() {
            Ok(())
        } else {
            Err(Error::ExternalToolFailed {
                tool: program.to_string(),
                code: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

/// Set of external tools known to be available for this run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    available: BTreeSet<String>,
}

impl Capabilities {
    /// Look up each tool on PATH once
    pub fn probe<'a>(tools: impl IntoIterator<Item = &'a str>) -> Self {
        let mut available = BTreeSet::new();
        let wanted: BTreeSet<&str> = tools.into_iter().collect();
        for tool in wanted {
            match which::which(tool) {
                Ok(path) => {
                    debug!("Found {} at {}", tool, path.display());
                    available.insert(tool.to_string());
                }
                Err(_) => debug!("{} not found on PATH", tool),
            }
        }
        Self { available }
    }

    /// Build a capability set from a known list, without probing
    pub fn from_available<'a>(tools: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            available: tools.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn has(&self, tool: &str) -> bool {
        self.available.contains(tool)
    }

    /// First tool from `required` that is missing, if any
    pub fn missing<'a>(&self, required: &[&'a str]) -> Option<&'a str> {
        required.iter().copied().find(|tool| !self.has(tool))
    }
}
