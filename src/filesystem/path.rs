// src/filesystem/path.rs

//! Path sanitization for archive entry names
//!
//! Archive entry names come from untrusted packages. Both directions of the
//! pipeline go through this module: extraction refuses entries that would
//! land outside the workspace, and repackaging refuses to write entry names
//! that would do the same on the next extraction (zip-slip).

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Validate an entry name read from an archive
///
/// Returns the relative path the entry should be extracted to.
///
/// - `.` components are dropped
/// - `..` components are rejected
/// - absolute names (leading `/`, drive prefixes) are rejected
/// - names that normalize to nothing are rejected
/// - `\` counts as a separator when looking for `..` or a leading root,
///   since Windows extractors split on it
///
/// # Examples
///
/// ```
/// use vsixpatch::filesystem::path::sanitize_entry_name;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     sanitize_entry_name("extension/package.json").unwrap(),
///     PathBuf::from("extension/package.json")
/// );
/// assert!(sanitize_entry_name("../../evil").is_err());
/// assert!(sanitize_entry_name("/etc/passwd").is_err());
/// assert!(sanitize_entry_name("..\\..\\evil.js").is_err());
/// ```
pub fn sanitize_entry_name(name: &str) -> Result<PathBuf> {
    check_backslash_segments(name)?;
    let mut normalized = PathBuf::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(name.to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::PathTraversal(format!("absolute entry name: {}", name)));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath(format!("empty entry name: {:?}", name)));
    }

    Ok(normalized)
}

/// Build the archive entry name for `path`, relative to `root`
///
/// The result always uses `/` separators and never contains `..` or a
/// leading `/`. A path that is not under `root`, or whose remainder still
/// walks upward, is rejected.
///
/// # Examples
///
/// ```
/// use vsixpatch::filesystem::path::archive_entry_name;
/// use std::path::Path;
///
/// let root = Path::new("/tmp/work/contents");
/// assert_eq!(
///     archive_entry_name(root, Path::new("/tmp/work/contents/extension/package.json")).unwrap(),
///     "extension/package.json"
/// );
/// assert!(archive_entry_name(root, Path::new("/tmp/work/contents/../../evil")).is_err());
/// ```
pub fn archive_entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        Error::PathTraversal(format!(
            "{} is outside {}",
            path.display(),
            root.display()
        ))
    })?;
    check_backslash_segments(&relative.to_string_lossy())?;

    let mut parts: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(c) => parts.push(c.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(relative.display().to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::PathTraversal(format!(
                    "absolute entry name: {}",
                    relative.display()
                )));
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::InvalidPath(format!(
            "{} has no name relative to {}",
            path.display(),
            root.display()
        )));
    }

    Ok(parts.join("/"))
}

/// On unix `\` is an ordinary file name character, so `..\evil` is a
/// single normal component to `Path`. Split on both separators instead.
fn check_backslash_segments(name: &str) -> Result<()> {
    if !name.contains('\\') {
        return Ok(());
    }
    if name.starts_with('\\') {
        return Err(Error::PathTraversal(format!("absolute entry name: {}", name)));
    }
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(Error::PathTraversal(name.to_string()));
    }
    Ok(())
}

/// Sanitize a filename (single path component) from an untrusted source
///
/// Rejects any path separators.
///
/// # Examples
///
/// ```
/// use vsixpatch::filesystem::path::sanitize_filename;
///
/// assert_eq!(sanitize_filename("ms-python.python-2024.1.0").unwrap(), "ms-python.python-2024.1.0");
/// assert!(sanitize_filename("../escape").is_err());
/// assert!(sanitize_filename("sub/dir").is_err());
/// ```
pub fn sanitize_filename(name: &str) -> Result<String> {
    if name.contains('/') || name.contains('\\') {
        return Err(Error::PathTraversal(format!(
            "Filename contains path separator: {}",
            name
        )));
    }

    if name == ".." || name == "." {
        return Err(Error::PathTraversal(format!("Invalid filename: {}", name)));
    }

    if name.is_empty() {
        return Err(Error::InvalidPath("Empty filename".to_string()));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_entry_name_normal() {
        assert_eq!(
            sanitize_entry_name("extension/out/main.js").unwrap(),
            PathBuf::from("extension/out/main.js")
        );
        assert_eq!(
            sanitize_entry_name("[Content_Types].xml").unwrap(),
            PathBuf::from("[Content_Types].xml")
        );
    }

    #[test]
    fn test_sanitize_entry_name_dot() {
        assert_eq!(
            sanitize_entry_name("./extension/./package.json").unwrap(),
            PathBuf::from("extension/package.json")
        );
    }

    #[test]
    fn test_sanitize_entry_name_traversal_rejected() {
        assert!(sanitize_entry_name("..").is_err());
        assert!(sanitize_entry_name("../../evil").is_err());
        assert!(sanitize_entry_name("extension/../../evil").is_err());
        assert!(matches!(
            sanitize_entry_name("a/b/../../../c"),
            Err(Error::PathTraversal(_))
        ));
    }

    #[test]
    fn test_sanitize_entry_name_backslash_traversal_rejected() {
        assert!(matches!(
            sanitize_entry_name(r"..\..\evil.js"),
            Err(Error::PathTraversal(_))
        ));
        assert!(sanitize_entry_name(r"extension\..\..\evil.js").is_err());
        assert!(sanitize_entry_name(r"extension/..\evil.js").is_err());
        assert!(sanitize_entry_name(r"\Windows\evil.dll").is_err());
        assert_eq!(
            sanitize_entry_name(r"docs\readme.md").unwrap(),
            PathBuf::from(r"docs\readme.md")
        );
    }

    #[test]
    fn test_sanitize_entry_name_absolute_rejected() {
        assert!(matches!(
            sanitize_entry_name("/etc/passwd"),
            Err(Error::PathTraversal(_))
        ));
    }

    #[test]
    fn test_sanitize_entry_name_empty_rejected() {
        assert!(sanitize_entry_name("").is_err());
        assert!(sanitize_entry_name("./").is_err());
    }

    #[test]
    fn test_archive_entry_name_relative() {
        let root = Path::new("/work/contents");
        assert_eq!(
            archive_entry_name(root, Path::new("/work/contents/package.json")).unwrap(),
            "package.json"
        );
        assert_eq!(
            archive_entry_name(root, Path::new("/work/contents/extension/out/a.js")).unwrap(),
            "extension/out/a.js"
        );
    }

    #[test]
    fn test_archive_entry_name_parent_traversal_rejected() {
        let root = Path::new("/work/contents");
        let result = archive_entry_name(root, Path::new("/work/contents/../../evil"));
        assert!(matches!(result, Err(Error::PathTraversal(_))));
    }

    #[test]
    fn test_archive_entry_name_backslash_traversal_rejected() {
        let root = Path::new("/work/contents");
        let result = archive_entry_name(root, Path::new(r"/work/contents/..\..\evil.js"));
        assert!(matches!(result, Err(Error::PathTraversal(_))));
    }

    #[test]
    fn test_archive_entry_name_outside_root_rejected() {
        let root = Path::new("/work/contents");
        assert!(archive_entry_name(root, Path::new("/elsewhere/file")).is_err());
        assert!(archive_entry_name(root, root).is_err());
    }

    #[test]
    fn test_sanitize_filename_path_rejected() {
        assert!(sanitize_filename("../pkg").is_err());
        assert!(sanitize_filename("sub\\pkg").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("").is_err());
    }
}
