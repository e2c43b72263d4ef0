// src/config.rs
//! Run configuration
//!
//! A TOML file with every key optional:
//!
//! ```toml
//! target_version = "^1.99.0"
//! platform = "vscode"
//! manifest_name = "package.json"
//! strategies = ["library-zip", "external-unzip", "vsce-probe", "vsix-layout"]
//! targets = ["copilot"]
//! tool_timeout_secs = 120
//! log_dir = "logs"
//! backup_dir = "/var/backups/extensions"
//! ```
//!
//! Command-line flags override whatever the file sets.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::manifest::DEFAULT_MANIFEST_NAME;
use crate::pipeline::PipelineOptions;
use crate::strategy::StrategyKind;
use crate::tools::{DEFAULT_TOOL_TIMEOUT, ToolRunner};

/// Compatibility value written when nothing else is configured
pub const DEFAULT_TARGET_VERSION: &str = "^1.99.0";

/// Host key inside `engines`
pub const DEFAULT_PLATFORM: &str = "vscode";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchConfig {
    /// Value written into `engines.<platform>`
    pub target_version: String,

    /// Compatibility key inside `engines`
    pub platform: String,

    /// Manifest file name searched for in each archive
    pub manifest_name: String,

    /// Strategies to try, in order
    pub strategies: Vec<StrategyKind>,

    /// Restrict a batch to archives whose file name contains one of these
    pub targets: Vec<String>,

    /// Bound on each external tool invocation
    pub tool_timeout_secs: u64,

    /// Where ledgers and the run log are written
    pub log_dir: PathBuf,

    /// Must exist before a run starts when set
    pub backup_dir: Option<PathBuf>,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            target_version: DEFAULT_TARGET_VERSION.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            strategies: StrategyKind::default_order(),
            targets: Vec::new(),
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT.as_secs(),
            log_dir: PathBuf::from("logs"),
            backup_dir: None,
        }
    }
}

impl PatchConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: PatchConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_version.trim().is_empty() {
            return Err(Error::Config("target_version must not be empty".to_string()));
        }

        // The platform becomes a single JSON key under `engines`
        if self.platform.is_empty() || self.platform.contains('.') {
            return Err(Error::Config(format!(
                "platform must be a non-empty key without '.', got {:?}",
                self.platform
            )));
        }

        if self.manifest_name.is_empty()
            || self.manifest_name.contains('/')
            || self.manifest_name.contains('\\')
        {
            return Err(Error::Config(format!(
                "manifest_name must be a bare file name, got {:?}",
                self.manifest_name
            )));
        }

        if self.strategies.is_empty() {
            return Err(Error::Config("at least one strategy is required".to_string()));
        }
        let mut seen = HashSet::new();
        for kind in &self.strategies {
            if !seen.insert(kind) {
                return Err(Error::Config(format!("strategy {} listed twice", kind)));
            }
        }

        if self.tool_timeout_secs == 0 {
            return Err(Error::Config("tool_timeout_secs must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Fail unless the configured backup directory exists
    pub fn check_backup_dir(&self) -> Result<()> {
        match &self.backup_dir {
            Some(dir) if !dir.is_dir() => Err(Error::Config(format!(
                "backup directory {} does not exist; create a backup before patching",
                dir.display()
            ))),
            _ => Ok(()),
        }
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn tool_runner(&self) -> ToolRunner {
        ToolRunner::new(self.tool_timeout())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::new(&self.target_version, &self.platform)
            .with_manifest_name(&self.manifest_name)
    }
}
