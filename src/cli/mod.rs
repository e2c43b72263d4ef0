// src/cli/mod.rs
//! CLI definitions for vsixpatch
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations live in the `commands` module.
//!
//! - `patch` - Rewrite the engine compatibility value in VSIX archives
//! - `classify` - Report the container kind of archives
//! - `extract` - Unpack an archive into an install directory
//! - `inspect` - Show what an archive's manifest declares
//! - `completions` - Generate shell completion scripts

use clap::{Parser, Subcommand};
use clap_complete::Shell;

mod patch;

pub use patch::PatchArgs;

#[derive(Parser)]
#[command(name = "vsixpatch")]
#[command(author = "vsixpatch Contributors")]
#[command(version)]
#[command(about = "Retarget VS Code extension packages at a new engine version", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Patch engines.<platform> in every archive found under the given paths
    ///
    /// Directories are searched recursively for *.vsix files. Each archive
    /// is rewritten in place; failures are recorded in the failure ledger
    /// and do not stop the run.
    Patch(PatchArgs),

    /// Print the container kind of each archive
    Classify {
        /// Archives to classify
        #[arg(required = true)]
        paths: Vec<std::path::PathBuf>,
    },

    /// Unpack an archive into <DEST>/<publisher.name>-<version>
    Extract {
        /// Archive to unpack
        archive: std::path::PathBuf,

        /// Directory that receives the extension directory
        #[arg(short, long)]
        dest: std::path::PathBuf,

        /// Replace an existing extension directory
        #[arg(long)]
        force: bool,
    },

    /// Show container kind, file name parts and manifest fields
    Inspect {
        /// Archive to inspect
        archive: std::path::PathBuf,

        /// Compatibility key to report from engines
        #[arg(long, default_value = vsixpatch::config::DEFAULT_PLATFORM)]
        platform: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
