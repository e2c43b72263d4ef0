// src/strategy/mod.rs

//! Extraction/repackaging strategies tried by the fallback orchestrator
//!
//! Each strategy supplies its own way of unpacking a ZIP into a directory
//! and packing a directory back into a ZIP. Everything around those two
//! steps (gzip unwrapping, manifest lookup, patching, gzip re-wrapping and
//! the atomic swap) is shared and lives in [`crate::pipeline`].
//!
//! Built-in strategies, in default order:
//!
//! | id | display name | needs |
//! |---|---|---|
//! | `library-zip` | Standard ZIP | nothing |
//! | `external-unzip` | Manual unzip | `unzip`, `zip` |
//! | `vsce-probe` | VSCE tool | `vsce`, `unzip`, `zip` |
//! | `vsix-layout` | VSIX layout | nothing |

mod external;
mod layout;
mod library;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

use crate::error::Result;
use crate::manifest;
use crate::tools::ToolRunner;

pub use external::{ExternalUnzipStrategy, VsceProbeStrategy};
pub use layout::VsixLayoutStrategy;
pub use library::LibraryZipStrategy;

/// One self-contained way of extracting and repackaging an archive
pub trait Strategy: Send + Sync {
    /// Name written to the ledgers and logs
    fn name(&self) -> &str;

    /// External tools that must be on PATH for this strategy to run
    fn required_tools(&self) -> &[&'static str] {
        &[]
    }

    /// Whether this strategy may try archives the classifier could not
    /// recognise (treating them as plain ZIP)
    fn accepts_unrecognized(&self) -> bool {
        false
    }

    /// Cheap check run on the (unwrapped) ZIP before extraction
    ///
    /// Returning [`crate::Error::NotApplicable`] declines the archive
    /// without counting as a failure.
    fn check_viability(&self, _zip: &Path) -> Result<()> {
        Ok(())
    }

    /// Unpack the ZIP at `zip` into `dest`
    fn extract(&self, zip: &Path, dest: &Path) -> Result<()>;

    /// Pick the manifest to patch inside the extracted tree
    fn locate_manifest(&self, root: &Path, manifest_name: &str) -> Option<PathBuf> {
        manifest::find_manifest(root, manifest_name)
    }

    /// Pack the tree at `root` into a new ZIP at `out`
    fn repackage(&self, root: &Path, out: &Path) -> Result<()>;
}

/// Built-in strategies selectable from configuration and the command line
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum StrategyKind {
    #[strum(serialize = "library-zip")]
    LibraryZip,
    #[strum(serialize = "external-unzip")]
    ExternalUnzip,
    #[strum(serialize = "vsce-probe")]
    VsceProbe,
    #[strum(serialize = "vsix-layout")]
    VsixLayout,
}

impl StrategyKind {
    /// Identifier used in configuration files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Self::LibraryZip => "library-zip",
            Self::ExternalUnzip => "external-unzip",
            Self::VsceProbe => "vsce-probe",
            Self::VsixLayout => "vsix-layout",
        }
    }

    /// Name written to the success ledger
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LibraryZip => "Standard ZIP",
            Self::ExternalUnzip => "Manual unzip",
            Self::VsceProbe => "VSCE tool",
            Self::VsixLayout => "VSIX layout",
        }
    }

    /// Default order: cheapest and most faithful first
    pub fn default_order() -> Vec<Self> {
        use strum::IntoEnumIterator;
        Self::iter().collect()
    }

    /// Instantiate the strategy; external tools are bounded by `runner`
    pub fn build(self, runner: ToolRunner) -> Box<dyn Strategy> {
        match self {
            Self::LibraryZip => Box::new(LibraryZipStrategy),
            Self::ExternalUnzip => Box::new(ExternalUnzipStrategy::new(runner)),
            Self::VsceProbe => Box::new(VsceProbeStrategy::new(runner)),
            Self::VsixLayout => Box::new(VsixLayoutStrategy),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Build the strategy list for `kinds`, keeping their order
pub fn build_all(kinds: &[StrategyKind], runner: ToolRunner) -> Vec<Box<dyn Strategy>> {
    kinds.iter().map(|kind| kind.build(runner)).collect()
}
