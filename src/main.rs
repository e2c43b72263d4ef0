// src/main.rs

mod cli;
mod commands;

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use vsixpatch::ledger;

/// Install the tracing subscriber
///
/// Console output honours `RUST_LOG` (default `info`). When `log_file` is
/// given, full debug detail is also written there without ANSI colours.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        );

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Patch(args) => {
            let config = commands::resolve_patch_config(&args)?;
            let timestamp = ledger::run_timestamp();
            let log_path = ledger::run_log_path(&config.log_dir, &timestamp);
            init_tracing(Some(&log_path))?;
            info!("Run log: {}", log_path.display());
            commands::cmd_patch(&config, &args.paths, args.quiet, &timestamp)
        }
        Commands::Classify { paths } => {
            init_tracing(None)?;
            commands::cmd_classify(&paths)
        }
        Commands::Extract {
            archive,
            dest,
            force,
        } => {
            init_tracing(None)?;
            commands::cmd_extract(&archive, &dest, force)
        }
        Commands::Inspect { archive, platform } => {
            init_tracing(None)?;
            commands::cmd_inspect(&archive, &platform)
        }
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
