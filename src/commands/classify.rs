// src/commands/classify.rs

use std::path::PathBuf;

use anyhow::Result;
use vsixpatch::archive;

/// Print the container kind of each archive
pub fn cmd_classify(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        if !path.is_file() {
            println!("{}: not found", path.display());
            continue;
        }
        println!("{}: {}", path.display(), archive::classify(path));
    }
    Ok(())
}
