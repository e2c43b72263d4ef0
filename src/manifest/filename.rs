// src/manifest/filename.rs

//! Extension identity parsed from archive file names
//!
//! Marketplace downloads follow one of two naming schemes:
//! - `publisher.name@version.vsix`
//! - `Publisher.name-version.vsix`

use regex::Regex;
use std::sync::LazyLock;

static AT_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<publisher>[^.@/]+)\.(?P<name>[^@/]+)@(?P<version>[^@/]+)\.vsix$")
        .expect("valid file-name pattern")
});

static DASH_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<publisher>[^./@]+)\.(?P<name>[^/@]+)-(?P<version>\d[^-/@]*)\.vsix$")
        .expect("valid file-name pattern")
});

/// Publisher, name and version encoded in a VSIX file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFileName {
    pub publisher: String,
    pub name: String,
    pub version: String,
}

impl ExtensionFileName {
    /// Parse a bare file name (no directory components)
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = AT_VERSION_RE
            .captures(file_name)
            .or_else(|| DASH_VERSION_RE.captures(file_name))?;

        Some(Self {
            publisher: caps["publisher"].to_string(),
            name: caps["name"].to_string(),
            version: caps["version"].to_string(),
        })
    }

    /// `publisher.name`
    pub fn id(&self) -> String {
        format!("{}.{}", self.publisher, self.name)
    }

    /// Directory name used when installing: `publisher.name-version`
    pub fn install_dir_name(&self) -> String {
        format!("{}-{}", self.id(), self.version)
    }
}

impl std::fmt::Display for ExtensionFileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id(), self.version)
    }
}
