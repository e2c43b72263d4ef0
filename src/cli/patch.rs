// src/cli/patch.rs
//! Arguments for the patch command

use std::path::PathBuf;

use clap::Args;
use vsixpatch::strategy::StrategyKind;

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Archives or directories containing archives
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Value written into engines.<platform> (default: ^1.99.0)
    #[arg(short = 't', long)]
    pub target_version: Option<String>,

    /// Compatibility key inside engines (default: vscode)
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Strategy to try, in order; repeat to build a list
    /// (library-zip, external-unzip, vsce-probe, vsix-layout)
    #[arg(short, long, value_parser = parse_strategy)]
    pub strategy: Vec<StrategyKind>,

    /// Only patch archives whose file name contains this text; repeatable
    #[arg(short, long)]
    pub filter: Vec<String>,

    /// Directory for ledgers and the run log (default: logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Timeout in seconds for each external tool call (default: 120)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Refuse to run unless this backup directory exists
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Hide the progress display
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_strategy(value: &str) -> Result<StrategyKind, String> {
    value
        .parse()
        .map_err(|_| format!("unknown strategy '{}'", value))
}
