// src/archive/extract.rs

//! In-process ZIP extraction

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_entry_name;

/// Maximum size for a single entry during extraction (512 MB).
pub const MAX_ENTRY_SIZE: u64 = 512 * 1024 * 1024;

/// Counts reported by [`extract_zip`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Extract every entry of the ZIP at `zip_path` under `dest`
///
/// The whole extraction fails on the first entry whose name would escape
/// `dest` or whose declared size exceeds [`MAX_ENTRY_SIZE`]. Unix permission
/// bits stored in the archive are restored where present.
pub fn extract_zip(zip_path: &Path, dest: &Path) -> Result<ExtractStats> {
    let file = File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut stats = ExtractStats::default();

    fs::create_dir_all(dest)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = sanitize_entry_name(entry.name())?;
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            stats.directories += 1;
            continue;
        }

        if entry.size() > MAX_ENTRY_SIZE {
            warn!("Refusing oversized entry: {} ({} bytes)", entry.name(), entry.size());
            return Err(Error::EntryTooLarge {
                path: entry.name().to_string(),
                limit: MAX_ENTRY_SIZE,
            });
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out_file = File::create(&out_path)?;
        let written = io::copy(&mut entry, &mut out_file)?;
        stats.files += 1;
        stats.bytes += written;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            // Keep the owner able to read and rewrite the file
            let mode = (mode & 0o777) | 0o600;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
        }
    }

    debug!(
        "Extracted {} files ({} bytes) from {} into {}",
        stats.files,
        stats.bytes,
        zip_path.display(),
        dest.display()
    );

    Ok(stats)
}

/// List the entry names of the ZIP at `zip_path`
pub fn entry_names(zip_path: &Path) -> Result<Vec<String>> {
    let file = File::open(zip_path)?;
    let archive = zip::ZipArchive::new(file)?;
    Ok(archive.file_names().map(str::to_string).collect())
}
