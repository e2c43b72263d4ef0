// src/strategy/library.rs

use std::path::Path;

use super::Strategy;
use crate::archive::{extract_zip, write_zip_from_tree};
use crate::error::Result;

/// In-process ZIP handling, no external tools
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryZipStrategy;

impl Strategy for LibraryZipStrategy {
    fn name(&self) -> &str {
        "Standard ZIP"
    }

    fn extract(&self, zip: &Path, dest: &Path) -> Result<()> {
        extract_zip(zip, dest)?;
        Ok(())
    }

    fn repackage(&self, root: &Path, out: &Path) -> Result<()> {
        write_zip_from_tree(root, out)?;
        Ok(())
    }
}
