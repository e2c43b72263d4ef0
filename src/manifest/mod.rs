// src/manifest/mod.rs

//! Extension manifest lookup and patching
//!
//! The manifest (`package.json`) carries the extension's name, publisher,
//! version and the `engines` object constraining which host versions may
//! load it. Patching only ever touches `engines.<platform>`; every other
//! field keeps its value and its position in the document.

pub mod filename;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

pub use filename::ExtensionFileName;

/// Conventional manifest file name inside a VSIX
pub const DEFAULT_MANIFEST_NAME: &str = "package.json";

/// Key of the compatibility object inside the manifest
pub const ENGINES_KEY: &str = "engines";

/// All files named `manifest_name` under `root`, in lookup order
///
/// At every directory level, files are examined before subdirectories and
/// both are visited in file-name order, so a manifest at the root always
/// wins over nested ones.
pub fn find_manifests(root: &Path, manifest_name: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| {
            (a.file_type().is_dir(), a.file_name()).cmp(&(b.file_type().is_dir(), b.file_name()))
        })
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == manifest_name)
        .map(|entry| entry.into_path())
        .collect()
}

/// First manifest under `root`, or `None` when the tree has none
///
/// Trees with several manifests (nested sub-extensions, bundled
/// dependencies) resolve to the first one in [`find_manifests`] order.
pub fn find_manifest(root: &Path, manifest_name: &str) -> Option<PathBuf> {
    let mut candidates = find_manifests(root, manifest_name).into_iter();
    let first = candidates.next()?;
    let others = candidates.count();
    if others > 0 {
        debug!(
            "Found {} additional {} file(s) under {}, using {}",
            others,
            manifest_name,
            root.display(),
            first.display()
        );
    }
    Some(first)
}

/// Compatibility value before and after a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub previous: Option<String>,
    pub current: String,
}

impl PatchOutcome {
    /// True when the manifest already carried the target value
    pub fn unchanged(&self) -> bool {
        self.previous.as_deref() == Some(self.current.as_str())
    }
}

/// Set `engines.<platform>` to `target` in the manifest at `path`
///
/// Creates the `engines` object when it is missing. The document is parsed
/// and re-serialized completely before anything is written, so malformed
/// input leaves the file untouched. The rewrite uses two-space indentation
/// and keeps a trailing newline if the original had one.
pub fn patch_engine(path: &Path, platform: &str, target: &str) -> Result<PatchOutcome> {
    let raw = fs::read_to_string(path)?;
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut document: Value =
        serde_json::from_str(text).map_err(|source| Error::ManifestMalformed {
            path: path.to_path_buf(),
            source,
        })?;

    let root = document.as_object_mut().ok_or_else(|| Error::ManifestShape {
        path: path.to_path_buf(),
        reason: "top-level value is not an object".to_string(),
    })?;

    let engines = root
        .entry(ENGINES_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| Error::ManifestShape {
            path: path.to_path_buf(),
            reason: format!("'{}' is not an object", ENGINES_KEY),
        })?;

    let previous = engines.get(platform).map(value_to_display);
    engines.insert(platform.to_string(), Value::String(target.to_string()));

    let mut serialized =
        serde_json::to_string_pretty(&document).map_err(|source| Error::ManifestMalformed {
            path: path.to_path_buf(),
            source,
        })?;
    if raw.ends_with('\n') {
        serialized.push('\n');
    }

    write_in_place(path, serialized.as_bytes())?;

    debug!(
        "Patched {}: {}.{} {:?} -> {}",
        path.display(),
        ENGINES_KEY,
        platform,
        previous,
        target
    );

    Ok(PatchOutcome {
        previous,
        current: target.to_string(),
    })
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_in_place(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    // NamedTempFile is created 0600; keep the manifest's own mode
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(staged.path(), metadata.permissions())?;
    }
    staged.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Read-only view of the manifest fields this tool reports on
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestSummary {
    pub name: Option<String>,
    pub publisher: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub engines: Map<String, Value>,
}

impl ManifestSummary {
    /// Load the summary from a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
        serde_json::from_str(text).map_err(|source| Error::ManifestMalformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compatibility constraint for `platform`, if declared
    pub fn engine(&self, platform: &str) -> Option<String> {
        self.engines.get(platform).map(value_to_display)
    }

    /// `publisher.name` when both are known, otherwise just the name
    pub fn id(&self) -> Option<String> {
        match (&self.publisher, &self.name) {
            (Some(publisher), Some(name)) => Some(format!("{}.{}", publisher, name)),
            (None, Some(name)) => Some(name.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_find_manifest_root_wins_over_nested() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a_bundled/package.json"), "{}");
        write(&dir.path().join("package.json"), "{}");

        assert_eq!(
            find_manifest(dir.path(), "package.json").unwrap(),
            dir.path().join("package.json")
        );
        assert_eq!(find_manifests(dir.path(), "package.json").len(), 2);
    }

    #[test]
    fn test_find_manifest_nested_in_extension_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("extension.vsixmanifest"), "<xml/>");
        write(&dir.path().join("extension/package.json"), "{}");
        write(&dir.path().join("extension/node_modules/dep/package.json"), "{}");

        assert_eq!(
            find_manifest(dir.path(), "package.json").unwrap(),
            dir.path().join("extension/package.json")
        );
    }

    #[test]
    fn test_find_manifest_none() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("extension/readme.md"), "hi");
        assert!(find_manifest(dir.path(), "package.json").is_none());
    }

    #[test]
    fn test_find_manifest_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("b/package.json"), "{}");
        write(&dir.path().join("a/package.json"), "{}");
        for _ in 0..3 {
            assert_eq!(
                find_manifest(dir.path(), "package.json").unwrap(),
                dir.path().join("a/package.json")
            );
        }
    }

    #[test]
    fn test_patch_engine_overwrites_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(
            &path,
            r#"{"name":"ext","publisher":"pub","version":"1.0.0","engines":{"vscode":"^1.80.0","node":">=18"}}"#,
        );

        let outcome = patch_engine(&path, "vscode", "^1.99.0").unwrap();
        assert_eq!(outcome.previous.as_deref(), Some("^1.80.0"));
        assert_eq!(outcome.current, "^1.99.0");

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["engines"]["vscode"], "^1.99.0");
        assert_eq!(doc["engines"]["node"], ">=18");
        assert_eq!(doc["name"], "ext");
    }

    #[cfg(unix)]
    #[test]
    fn test_patch_engine_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(&path, r#"{"engines":{"vscode":"^1.0.0"}}"#);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        patch_engine(&path, "vscode", "^1.99.0").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_patch_engine_creates_engines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(&path, r#"{"name":"ext","version":"0.1.0"}"#);

        let outcome = patch_engine(&path, "vscode", "^1.99.0").unwrap();
        assert_eq!(outcome.previous, None);

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["engines"]["vscode"], "^1.99.0");
    }

    #[test]
    fn test_patch_engine_preserves_field_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(
            &path,
            r#"{"version":"1.0.0","name":"ext","engines":{"vscode":"^1.0.0"},"main":"./out/a.js"}"#,
        );

        patch_engine(&path, "vscode", "^1.99.0").unwrap();
        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["version", "name", "engines", "main"]);
    }

    #[test]
    fn test_patch_engine_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(&path, "{\n  \"name\": \"ext\",\n  \"engines\": {\n    \"vscode\": \"^1.0.0\"\n  }\n}\n");

        patch_engine(&path, "vscode", "^1.99.0").unwrap();
        let first = fs::read_to_string(&path).unwrap();

        let outcome = patch_engine(&path, "vscode", "^1.99.0").unwrap();
        assert!(outcome.unchanged());
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert!(second.ends_with('\n'));
    }

    #[test]
    fn test_patch_engine_non_string_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(&path, r#"{"engines":{"vscode":1}}"#);

        let outcome = patch_engine(&path, "vscode", "^1.99.0").unwrap();
        assert_eq!(outcome.previous.as_deref(), Some("1"));
    }

    #[test]
    fn test_patch_engine_malformed_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(&path, "{ not json");

        let result = patch_engine(&path, "vscode", "^1.99.0");
        assert!(matches!(result, Err(Error::ManifestMalformed { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_patch_engine_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let array = dir.path().join("array.json");
        write(&array, "[1, 2]");
        assert!(matches!(
            patch_engine(&array, "vscode", "^1.99.0"),
            Err(Error::ManifestShape { .. })
        ));

        let engines = dir.path().join("engines.json");
        write(&engines, r#"{"engines":"vscode"}"#);
        assert!(matches!(
            patch_engine(&engines, "vscode", "^1.99.0"),
            Err(Error::ManifestShape { .. })
        ));
    }

    #[test]
    fn test_patch_engine_accepts_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(&path, "\u{feff}{\"engines\":{\"vscode\":\"^1.0.0\"}}");

        let outcome = patch_engine(&path, "vscode", "^1.99.0").unwrap();
        assert_eq!(outcome.previous.as_deref(), Some("^1.0.0"));
        assert!(!fs::read_to_string(&path).unwrap().starts_with('\u{feff}'));
    }

    #[test]
    fn test_manifest_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        write(
            &path,
            r#"{"name":"python","publisher":"ms-python","version":"2024.1.0","engines":{"vscode":"^1.82.0"}}"#,
        );

        let summary = ManifestSummary::load(&path).unwrap();
        assert_eq!(summary.id().as_deref(), Some("ms-python.python"));
        assert_eq!(summary.engine("vscode").as_deref(), Some("^1.82.0"));
        assert_eq!(summary.engine("node"), None);
    }
}
