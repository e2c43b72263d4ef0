// src/archive/mod.rs

//! VSIX archive containers
//!
//! A VSIX package is a ZIP archive, but mirrors sometimes serve it wrapped
//! in a gzip stream. The container kind is always inferred from the bytes,
//! never from the file extension.
//!
//! - [`classify`] decides between plain ZIP, gzip-wrapped ZIP and unknown
//! - [`extract`] unpacks a ZIP into a directory with zip-slip rejection
//! - [`repack`] rebuilds a ZIP from a directory, re-applies the gzip layer
//!   and swaps the result over the original path atomically

pub mod extract;
pub mod repack;

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::compression::{self, CompressionFormat};

pub use extract::extract_zip;
pub use repack::{packable_entries, replace_atomically, wrap_container, write_zip_from_tree};

/// Container layout of an archive on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// ZIP bytes directly
    PlainZip,
    /// A gzip stream whose payload is a ZIP archive
    GzipWrappedZip,
    /// Neither of the above could be recognised
    Unknown,
}

impl ContainerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlainZip => "plain-zip",
            Self::GzipWrappedZip => "gzip-wrapped-zip",
            Self::Unknown => "unknown",
        }
    }

    /// Kind to write back after repackaging
    ///
    /// Archives that only an external tool could read are written back as
    /// plain ZIP.
    pub fn output_kind(&self) -> Self {
        match self {
            Self::GzipWrappedZip => Self::GzipWrappedZip,
            Self::PlainZip | Self::Unknown => Self::PlainZip,
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classify the container kind of the archive at `path`
///
/// The gzip magic number is checked before any ZIP parsing: gzip-wrapped
/// archives never parse as ZIP, so the cheap check goes first. Only the
/// outer layer is inspected; a gzip stream with a non-ZIP payload still
/// classifies as [`ContainerKind::GzipWrappedZip`] and fails later at
/// extraction.
///
/// Never fails: unreadable or unrecognised files are `Unknown`.
pub fn classify(path: &Path) -> ContainerKind {
    match compression::read_magic(path) {
        Ok(magic) if CompressionFormat::from_magic_bytes(&magic) == CompressionFormat::Gzip => {
            debug!("{}: gzip magic found", path.display());
            return ContainerKind::GzipWrappedZip;
        }
        Ok(_) => {}
        Err(e) => {
            debug!("{}: cannot read magic bytes: {}", path.display(), e);
            return ContainerKind::Unknown;
        }
    }

    match File::open(path).map(zip::ZipArchive::new) {
        Ok(Ok(_)) => ContainerKind::PlainZip,
        Ok(Err(e)) => {
            debug!("{}: not a ZIP archive: {}", path.display(), e);
            ContainerKind::Unknown
        }
        Err(e) => {
            debug!("{}: cannot open: {}", path.display(), e);
            ContainerKind::Unknown
        }
    }
}
