// src/pipeline.rs

//! One full patch pass over a single archive with a single strategy
//!
//! Stages run strictly in order: classify, unwrap gzip, extract, locate the
//! manifest, patch it, repackage, re-wrap, replace. The original archive is
//! only touched by the final atomic replace, so any earlier failure leaves
//! it byte-for-byte intact. All intermediate files live in a private
//! temporary workspace that is removed on every exit path.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::archive::{self, ContainerKind};
use crate::compression;
use crate::error::{Error, Result};
use crate::manifest::{self, DEFAULT_MANIFEST_NAME, PatchOutcome};
use crate::strategy::Strategy;

/// Prefix for private extraction workspaces
const WORKSPACE_PREFIX: &str = "vsix_update_";

/// What to write into the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Value written into `engines.<platform>`
    pub target_version: String,
    /// Key inside `engines`
    pub platform: String,
    /// Manifest file name to search for
    pub manifest_name: String,
}

impl PipelineOptions {
    pub fn new(target_version: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            target_version: target_version.into(),
            platform: platform.into(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
        }
    }

    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }
}

/// A fully unpacked archive in its private workspace
///
/// Dropping this removes the workspace and everything in it.
#[derive(Debug)]
pub struct ExtractionResult {
    workspace: TempDir,
    root: PathBuf,
    kind: ContainerKind,
}

impl ExtractionResult {
    /// Root of the unpacked archive contents
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classifier branch the archive went through
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Scratch directory for intermediate files, outside [`Self::root`]
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }
}

/// Classify `archive`, strip any gzip layer into `scratch` and run the
/// strategy's viability check. Returns the kind and the ZIP to extract.
fn prepare_source(
    strategy: &dyn Strategy,
    archive: &Path,
    scratch: &Path,
) -> Result<(ContainerKind, PathBuf)> {
    let kind = archive::classify(archive);
    debug!("{}: classified as {}", archive.display(), kind);

    let zip_source = match kind {
        ContainerKind::GzipWrappedZip => {
            let inner = scratch.join("extracted.zip");
            let size = compression::gunzip_file(archive, &inner)?;
            debug!("{}: unwrapped {} bytes of gzip payload", archive.display(), size);
            inner
        }
        ContainerKind::PlainZip => archive.to_path_buf(),
        ContainerKind::Unknown if strategy.accepts_unrecognized() => {
            debug!(
                "{}: unrecognised container, letting {} try it as ZIP",
                archive.display(),
                strategy.name()
            );
            archive.to_path_buf()
        }
        ContainerKind::Unknown => {
            return Err(Error::ClassificationAmbiguous(archive.to_path_buf()));
        }
    };

    strategy.check_viability(&zip_source)?;
    Ok((kind, zip_source))
}

/// Unpack `archive` into a fresh private workspace using `strategy`
pub fn extract_archive(strategy: &dyn Strategy, archive: &Path) -> Result<ExtractionResult> {
    let workspace = tempfile::Builder::new()
        .prefix(WORKSPACE_PREFIX)
        .tempdir()?;

    let (kind, zip_source) = prepare_source(strategy, archive, workspace.path())?;

    let root = workspace.path().join("contents");
    strategy.extract(&zip_source, &root)?;

    Ok(ExtractionResult {
        workspace,
        root,
        kind,
    })
}

/// Unpack `archive` directly into `dest`, whatever its container kind
///
/// Used for installing extensions rather than patching them; the archive
/// itself is never modified.
pub fn unpack_into(strategy: &dyn Strategy, archive: &Path, dest: &Path) -> Result<ContainerKind> {
    let scratch = tempfile::Builder::new()
        .prefix(WORKSPACE_PREFIX)
        .tempdir()?;

    let (kind, zip_source) = prepare_source(strategy, archive, scratch.path())?;
    strategy.extract(&zip_source, dest)?;
    Ok(kind)
}

/// Run the full patch pipeline on `archive` with `strategy`
///
/// On success the archive at its original path has been replaced by a
/// repackaged copy in the same container kind whose manifest carries the
/// target compatibility value.
pub fn run_pipeline(
    strategy: &dyn Strategy,
    archive: &Path,
    options: &PipelineOptions,
) -> Result<PatchOutcome> {
    let extraction = extract_archive(strategy, archive)?;

    let manifest_path = strategy
        .locate_manifest(extraction.root(), &options.manifest_name)
        .ok_or_else(|| Error::ManifestNotFound(options.manifest_name.clone()))?;
    debug!("Manifest: {}", manifest_path.display());

    let outcome =
        manifest::patch_engine(&manifest_path, &options.platform, &options.target_version)?;
    if outcome.unchanged() {
        debug!("{}: already targets {}, repackaging anyway", archive.display(), outcome.current);
    }

    let repacked = extraction.workspace().join("repacked.zip");
    strategy.repackage(extraction.root(), &repacked)?;

    let finished = archive::wrap_container(&repacked, extraction.kind(), extraction.workspace())?;
    archive::replace_atomically(&finished, archive)?;

    info!(
        "Updated {} with {}: {} -> {}",
        archive.display(),
        strategy.name(),
        outcome.previous.as_deref().unwrap_or("none"),
        outcome.current
    );

    Ok(outcome)
}
