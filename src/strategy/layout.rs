// src/strategy/layout.rs

//! VSIX-layout heuristic
//!
//! A marketplace VSIX carries `extension.vsixmanifest` at the archive root
//! and the extension itself under `extension/`. When that layout is
//! present, the manifest at `extension/package.json` is the one the host
//! reads, so it is preferred over whatever a generic search finds first.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::Strategy;
use crate::archive::extract::entry_names;
use crate::archive::{extract_zip, write_zip_from_tree};
use crate::error::{Error, Result};
use crate::manifest;

/// Root marker of the VSIX packaging layout
pub const VSIX_MANIFEST: &str = "extension.vsixmanifest";

/// Directory holding the extension payload in the VSIX layout
pub const EXTENSION_DIR: &str = "extension";

#[derive(Debug, Default, Clone, Copy)]
pub struct VsixLayoutStrategy;

impl Strategy for VsixLayoutStrategy {
    fn name(&self) -> &str {
        "VSIX layout"
    }

    fn check_viability(&self, zip: &Path) -> Result<()> {
        let names = entry_names(zip)?;
        if names.iter().any(|name| name == VSIX_MANIFEST) {
            Ok(())
        } else {
            Err(Error::NotApplicable(format!("no {} at archive root", VSIX_MANIFEST)))
        }
    }

    fn extract(&self, zip: &Path, dest: &Path) -> Result<()> {
        extract_zip(zip, dest)?;
        Ok(())
    }

    fn locate_manifest(&self, root: &Path, manifest_name: &str) -> Option<PathBuf> {
        let declared = root.join(EXTENSION_DIR).join(manifest_name);
        if declared.is_file() {
            debug!("Using layout manifest {}", declared.display());
            return Some(declared);
        }
        manifest::find_manifest(root, manifest_name)
    }

    fn repackage(&self, root: &Path, out: &Path) -> Result<()> {
        write_zip_from_tree(root, out)?;
        Ok(())
    }
}
