// src/error.rs

//! Error types for the VSIX patching pipeline
//!
//! Every stage returns `crate::error::Result`. The orchestrator converts
//! failures into "try the next strategy" signals, so none of these variants
//! abort a batch run on their own.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Neither the gzip magic number nor a ZIP central directory was found
    #[error("Could not extract file: {0} is neither a ZIP nor a gzip-wrapped ZIP archive")]
    ClassificationAmbiguous(PathBuf),

    /// No manifest anywhere in the extracted tree
    #[error("No {0} found")]
    ManifestNotFound(String),

    /// Manifest exists but is not valid JSON
    #[error("Failed to parse {path}: {source}")]
    ManifestMalformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Manifest is valid JSON but not shaped like a package manifest
    #[error("Unexpected manifest layout in {path}: {reason}")]
    ManifestShape { path: PathBuf, reason: String },

    /// Writing the replacement archive failed
    #[error("Failed to write archive: {0}")]
    RepackageIo(String),

    /// A strategy needs a tool that is not on PATH
    #[error("Required tool '{0}' not found on PATH")]
    ExternalToolUnavailable(String),

    /// An external tool exited with a non-zero status
    #[error("'{tool}' failed with exit code {code}: {stderr}")]
    ExternalToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    /// An external tool ran past the configured timeout and was killed
    #[error("'{tool}' timed out after {secs} seconds")]
    ExternalToolTimeout { tool: String, secs: u64 },

    /// A strategy declined this archive layout
    #[error("Not applicable: {0}")]
    NotApplicable(String),

    /// Entry name escapes the archive root
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    /// Entry name is empty or otherwise unusable
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Entry larger than the extraction limit
    #[error("Entry {path} exceeds the {limit} byte extraction limit")]
    EntryTooLarge { path: String, limit: u64 },

    #[error(transparent)]
    Compression(#[from] crate::compression::CompressionError),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the strategy never really ran (tool absent or layout declined).
    ///
    /// Skips are recorded in the attempt list but are not reported to the
    /// operator as failures.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::ExternalToolUnavailable(_) | Self::NotApplicable(_))
    }

    /// True when the archive simply carries no manifest
    pub fn is_manifest_missing(&self) -> bool {
        matches!(self, Self::ManifestNotFound(_))
    }
}
