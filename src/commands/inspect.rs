// src/commands/inspect.rs

//! Read-only archive inspection

use std::path::Path;

use anyhow::{Context, Result};
use vsixpatch::manifest::filename::ExtensionFileName;
use vsixpatch::manifest::{DEFAULT_MANIFEST_NAME, ManifestSummary};
use vsixpatch::pipeline;
use vsixpatch::strategy::{LibraryZipStrategy, Strategy, VsixLayoutStrategy};

/// Show what an archive contains without modifying it
pub fn cmd_inspect(archive: &Path, platform: &str) -> Result<()> {
    let extraction = pipeline::extract_archive(&LibraryZipStrategy, archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;

    println!("Archive:    {}", archive.display());
    println!("Container:  {}", extraction.kind());

    let parsed = archive
        .file_name()
        .and_then(|n| ExtensionFileName::parse(&n.to_string_lossy()));
    match parsed {
        Some(parsed) => println!("File name:  {}", parsed),
        None => println!("File name:  (unrecognised naming scheme)"),
    }

    let Some(manifest_path) =
        VsixLayoutStrategy.locate_manifest(extraction.root(), DEFAULT_MANIFEST_NAME)
    else {
        println!("Manifest:   none");
        return Ok(());
    };

    let relative = manifest_path
        .strip_prefix(extraction.root())
        .unwrap_or(&manifest_path);
    println!("Manifest:   {}", relative.display());

    let summary = ManifestSummary::load(&manifest_path)?;
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("  Id:           {}", summary.id().unwrap_or_else(|| "-".to_string()));
    println!("  Display name: {}", show(&summary.display_name));
    println!("  Version:      {}", show(&summary.version));
    println!(
        "  engines.{}: {}",
        platform,
        summary.engine(platform).unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}
