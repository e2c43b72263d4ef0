// tests/common/mod.rs

//! Shared fixtures for integration tests: in-memory archives and readers.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use zip::write::FileOptions;

/// Build a ZIP in memory from (name, content) pairs, in the given order
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Write a plain ZIP archive named `name` into `dir`
pub fn write_plain_vsix(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, zip_bytes(entries)).unwrap();
    path
}

/// Write a gzip-wrapped ZIP archive named `name` into `dir`
pub fn write_gzip_vsix(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, gzip_bytes(&zip_bytes(entries))).unwrap();
    path
}

/// Typical marketplace layout with the given manifest text
pub fn marketplace_entries(manifest: &str) -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("extension.vsixmanifest", b"<PackageManifest Version=\"2.0.0\"/>".to_vec()),
        ("[Content_Types].xml", b"<Types/>".to_vec()),
        ("extension/package.json", manifest.as_bytes().to_vec()),
        ("extension/out/extension.js", b"exports.activate = () => {};\n".to_vec()),
        ("extension/README.md", b"# Example\n".to_vec()),
    ]
}

/// Borrow owned fixture entries in the shape the writers take
pub fn as_entries<'a>(owned: &'a [(&'static str, Vec<u8>)]) -> Vec<(&'static str, &'a [u8])> {
    owned.iter().map(|(n, c)| (*n, c.as_slice())).collect()
}

/// Read every file entry of a plain or gzip-wrapped archive
pub fn read_entries(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let raw = std::fs::read(path).unwrap();
    let zip_data = if raw.starts_with(&[0x1f, 0x8b]) {
        let mut out = Vec::new();
        MultiGzDecoder::new(raw.as_slice())
            .read_to_end(&mut out)
            .unwrap();
        out
    } else {
        raw
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(zip_data)).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        if file.is_dir() {
            continue;
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        entries.insert(file.name().to_string(), content);
    }
    entries
}

/// Parse a JSON entry out of an archive
pub fn read_json_entry(path: &Path, entry: &str) -> serde_json::Value {
    let entries = read_entries(path);
    let bytes = entries
        .get(entry)
        .unwrap_or_else(|| panic!("{} missing from {}", entry, path.display()));
    serde_json::from_slice(bytes).unwrap()
}

/// Ledger lines without the generated-on header
pub fn ledger_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn tool_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}
