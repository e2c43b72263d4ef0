// src/strategy/external.rs

//! Strategies backed by command-line tools
//!
//! `unzip` tolerates archives the in-process reader rejects (prepended
//! data, odd central directories), so these strategies also accept files
//! the classifier could not recognise.

use std::ffi::OsStr;
use std::path::Path;

use tracing::debug;

use super::Strategy;
use crate::archive;
use crate::error::{Error, Result};
use crate::tools::ToolRunner;

fn unzip_into(runner: &ToolRunner, zip: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    let args: [&OsStr; 5] = [
        OsStr::new("-q"),
        OsStr::new("-o"),
        zip.as_os_str(),
        OsStr::new("-d"),
        dest.as_os_str(),
    ];
    runner.run("unzip", &args, None)
}

fn zip_tree(runner: &ToolRunner, root: &Path, out: &Path) -> Result<()> {
    // `zip -r` follows links and stores any name it is given
    let entries = archive::packable_entries(root)?;
    debug!("{} entries to pack from {}", entries.len(), root.display());

    // zip resolves `out` relative to the tree, so it must be absolute
    let out = if out.is_absolute() {
        out.to_path_buf()
    } else {
        std::env::current_dir()?.join(out)
    };
    let args: [&OsStr; 4] = [
        OsStr::new("-q"),
        OsStr::new("-r"),
        out.as_os_str(),
        OsStr::new("."),
    ];
    runner.run("zip", &args, Some(root))?;

    if !out.exists() {
        return Err(Error::RepackageIo(format!(
            "zip reported success but {} was not created",
            out.display()
        )));
    }
    Ok(())
}

/// `unzip` to extract, `zip -r` to repackage
#[derive(Debug, Clone, Copy)]
pub struct ExternalUnzipStrategy {
    runner: ToolRunner,
}

impl ExternalUnzipStrategy {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }
}

impl Strategy for ExternalUnzipStrategy {
    fn name(&self) -> &str {
        "Manual unzip"
    }

    fn required_tools(&self) -> &[&'static str] {
        &["unzip", "zip"]
    }

    fn accepts_unrecognized(&self) -> bool {
        true
    }

    fn extract(&self, zip: &Path, dest: &Path) -> Result<()> {
        unzip_into(&self.runner, zip, dest)
    }

    fn repackage(&self, root: &Path, out: &Path) -> Result<()> {
        zip_tree(&self.runner, root, out)
    }
}

/// Probe the archive with `vsce ls`, then proceed like [`ExternalUnzipStrategy`]
///
/// `vsce` has no extract command; it is only used to confirm the package
/// is readable by the official tooling before falling back to unzip/zip.
#[derive(Debug, Clone, Copy)]
pub struct VsceProbeStrategy {
    runner: ToolRunner,
}

impl VsceProbeStrategy {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }
}

impl Strategy for VsceProbeStrategy {
    fn name(&self) -> &str {
        "VSCE tool"
    }

    fn required_tools(&self) -> &[&'static str] {
        &["vsce", "unzip", "zip"]
    }

    fn check_viability(&self, zip: &Path) -> Result<()> {
        let args: [&OsStr; 2] = [OsStr::new("ls"), zip.as_os_str()];
        self.runner.run("vsce", &args, None)?;
        debug!("vsce can list {}", zip.display());
        Ok(())
    }

    fn extract(&self, zip: &Path, dest: &Path) -> Result<()> {
        unzip_into(&self.runner, zip, dest)
    }

    fn repackage(&self, root: &Path, out: &Path) -> Result<()> {
        zip_tree(&self.runner, root, out)
    }
}
