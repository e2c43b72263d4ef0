// src/commands/mod.rs
//! Command handlers for the vsixpatch CLI

mod classify;
mod extract;
mod inspect;
mod patch;
pub mod progress;

pub use classify::cmd_classify;
pub use extract::cmd_extract;
pub use inspect::cmd_inspect;
pub use patch::{cmd_patch, resolve_patch_config};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

/// Write completion script for `shell` to stdout
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut command = crate::cli::Cli::command();
    clap_complete::generate(shell, &mut command, "vsixpatch", &mut std::io::stdout());
    Ok(())
}
