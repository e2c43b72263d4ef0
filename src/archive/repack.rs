// src/archive/repack.rs

//! Rebuild archives from an extracted tree
//!
//! Repackaging never touches the original archive until a complete
//! replacement exists: the new ZIP (and its gzip wrapper, if any) is built
//! inside the private workspace, copied into a temporary file next to the
//! original and only then renamed over it.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use super::ContainerKind;
use crate::compression;
use crate::error::{Error, Result};
use crate::filesystem::path::archive_entry_name;

/// Collect the regular files under `root` with their archive entry names
///
/// Sorted by walk order. Fails on the first symbolic link or on any name
/// that could escape the extraction root, so nothing outside the extracted
/// tree can end up in a repackaged archive.
pub fn packable_entries(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::RepackageIo(e.to_string()))?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }
        if file_type.is_symlink() {
            return Err(Error::InvalidPath(format!(
                "refusing to package symbolic link {}",
                entry.path().display()
            )));
        }

        let name = archive_entry_name(root, entry.path())?;
        entries.push((name, entry.into_path()));
    }

    Ok(entries)
}

/// Write every regular file under `root` into a new ZIP at `out`
///
/// Entry names are relative to `root` with `/` separators, in sorted walk
/// order, deflate-compressed. Symbolic links are refused rather than
/// followed. Returns the number of entries written.
pub fn write_zip_from_tree(root: &Path, out: &Path) -> Result<usize> {
    let entries = packable_entries(root)?;

    let file = File::create(out).map_err(|e| repack_io(out, e))?;
    let mut writer = zip::ZipWriter::new(BufWriter::new(file));

    for (name, path) in &entries {
        let options = entry_options(path)?;

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| Error::RepackageIo(format!("{}: {}", name, e)))?;
        let mut input = BufReader::new(File::open(path).map_err(|e| repack_io(path, e))?);
        io::copy(&mut input, &mut writer).map_err(|e| repack_io(out, e))?;
    }

    let mut inner = writer
        .finish()
        .map_err(|e| Error::RepackageIo(format!("{}: {}", out.display(), e)))?;
    inner.flush().map_err(|e| repack_io(out, e))?;

    debug!(
        "Packed {} entries from {} into {}",
        entries.len(),
        root.display(),
        out.display()
    );
    Ok(entries.len())
}

fn entry_options(path: &Path) -> Result<FileOptions> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(path).map_err(|e| repack_io(path, e))?.permissions().mode();
        options.unix_permissions(mode & 0o777)
    };

    #[cfg(not(unix))]
    let _ = path;

    Ok(options)
}

/// Apply the container layer for `kind` to a freshly written ZIP
///
/// Returns the path of the finished archive: `zip_path` itself for plain
/// ZIP output, or a gzip-compressed copy written into `workspace`.
pub fn wrap_container(zip_path: &Path, kind: ContainerKind, workspace: &Path) -> Result<PathBuf> {
    match kind.output_kind() {
        ContainerKind::GzipWrappedZip => {
            let wrapped = workspace.join("repacked.vsix.gz");
            debug!("Re-wrapping {} as gzip", zip_path.display());
            compression::gzip_file(zip_path, &wrapped)
                .map_err(|e| Error::RepackageIo(e.to_string()))?;
            Ok(wrapped)
        }
        _ => Ok(zip_path.to_path_buf()),
    }
}

/// Replace `dest` with the contents of `src` without ever exposing a
/// partially written file at `dest`
///
/// The bytes are staged in a temporary file in `dest`'s directory, synced,
/// given `dest`'s permissions and renamed over it.
pub fn replace_atomically(src: &Path, dest: &Path) -> Result<()> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut staged = NamedTempFile::new_in(&parent).map_err(|e| repack_io(&parent, e))?;
    {
        let mut input = BufReader::new(File::open(src).map_err(|e| repack_io(src, e))?);
        io::copy(&mut input, staged.as_file_mut()).map_err(|e| repack_io(staged.path(), e))?;
    }
    staged
        .as_file()
        .sync_all()
        .map_err(|e| repack_io(staged.path(), e))?;

    if let Ok(metadata) = fs::metadata(dest) {
        fs::set_permissions(staged.path(), metadata.permissions())
            .map_err(|e| repack_io(staged.path(), e))?;
    }

    staged
        .persist(dest)
        .map_err(|e| repack_io(dest, e.error))?;

    debug!("Replaced {}", dest.display());
    Ok(())
}

fn repack_io(path: &Path, err: io::Error) -> Error {
    Error::RepackageIo(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut out = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf).unwrap();
            out.push((entry.name().to_string(), buf));
        }
        out
    }

    #[test]
    fn test_write_zip_relative_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("contents");
        fs::create_dir_all(root.join("extension/out")).unwrap();
        fs::write(root.join("extension.vsixmanifest"), b"<xml/>").unwrap();
        fs::write(root.join("extension/package.json"), b"{}").unwrap();
        fs::write(root.join("extension/out/main.js"), b"main").unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();

        let out = dir.path().join("out.zip");
        assert_eq!(write_zip_from_tree(&root, &out).unwrap(), 3);

        let entries = read_entries(&out);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["extension/out/main.js", "extension/package.json", "extension.vsixmanifest"]
        );
        for name in names {
            assert!(!name.starts_with('/'));
            assert!(!name.split('/').any(|c| c == ".."));
        }
        assert_eq!(entries[0].1, b"main");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_zip_refuses_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("contents");
        fs::create_dir_all(&root).unwrap();
        fs::write(dir.path().join("secret"), b"outside").unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret"), root.join("link")).unwrap();

        let result = write_zip_from_tree(&root, &dir.path().join("out.zip"));
        assert!(matches!(result, Err(Error::InvalidPath(_))));
        assert!(packable_entries(&root).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_packable_entries_rejects_backslash_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("contents");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("package.json"), b"{}").unwrap();
        fs::write(root.join(r"..\..\evil.js"), b"evil").unwrap();

        let result = packable_entries(&root);
        assert!(matches!(result, Err(Error::PathTraversal(_))));
        assert!(write_zip_from_tree(&root, &dir.path().join("out.zip")).is_err());
    }

    #[test]
    fn test_wrap_container_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("repacked.zip");
        fs::write(&zip_path, b"PK\x03\x04payload").unwrap();

        let wrapped = wrap_container(&zip_path, ContainerKind::GzipWrappedZip, dir.path()).unwrap();
        assert_ne!(wrapped, zip_path);
        assert_eq!(&fs::read(&wrapped).unwrap()[..2], &[0x1f, 0x8b]);

        let plain = wrap_container(&zip_path, ContainerKind::PlainZip, dir.path()).unwrap();
        assert_eq!(plain, zip_path);
    }

    #[test]
    fn test_replace_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("new.vsix");
        let dest = dir.path().join("target.vsix");
        fs::write(&src, b"new bytes").unwrap();
        fs::write(&dest, b"old bytes").unwrap();

        replace_atomically(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new bytes");

        // Only the two files remain, no staging leftovers
        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_replace_atomically_missing_source_keeps_dest() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("target.vsix");
        fs::write(&dest, b"old bytes").unwrap();

        let result = replace_atomically(&dir.path().join("missing"), &dest);
        assert!(matches!(result, Err(Error::RepackageIo(_))));
        assert_eq!(fs::read(&dest).unwrap(), b"old bytes");
    }
}
