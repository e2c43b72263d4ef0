// src/commands/extract.rs

//! Extension install extraction
//!
//! Unpacks an archive of either container kind into
//! `<dest>/<publisher.name>-<version>`, the directory layout the editor
//! expects under its extensions folder.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use vsixpatch::filesystem::sanitize_filename;
use vsixpatch::manifest::filename::ExtensionFileName;
use vsixpatch::pipeline;
use vsixpatch::strategy::LibraryZipStrategy;

pub fn cmd_extract(archive: &Path, dest: &Path, force: bool) -> Result<()> {
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", archive.display()))?;

    let parsed = ExtensionFileName::parse(&file_name).with_context(|| {
        format!(
            "Cannot derive extension id from '{}'; expected publisher.name@version.vsix",
            file_name
        )
    })?;

    let dir_name = sanitize_filename(&parsed.install_dir_name())?;
    let target = dest.join(dir_name);
    if target.exists() {
        if !force {
            anyhow::bail!(
                "{} already exists (use --force to replace it)",
                target.display()
            );
        }
        info!("Removing existing {}", target.display());
        fs::remove_dir_all(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
    }

    match pipeline::unpack_into(&LibraryZipStrategy, archive, &target) {
        Ok(kind) => {
            println!("Extracted {} ({}) to {}", parsed, kind, target.display());
            Ok(())
        }
        Err(e) => {
            if target.exists()
                && let Err(cleanup) = fs::remove_dir_all(&target)
            {
                warn!("Failed to clean up {}: {}", target.display(), cleanup);
            }
            Err(e).with_context(|| format!("Failed to extract {}", archive.display()))
        }
    }
}
