// src/compression/mod.rs

//! Gzip wrapping for archive containers
//!
//! Some VSIX mirrors serve packages as a gzip stream wrapping the ZIP
//! archive. This module detects that wrapping from magic bytes and converts
//! between the wrapped and unwrapped forms on disk.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use thiserror::Error;

/// Gzip magic number (RFC 1952)
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to open {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("Failed to decompress {format} data: {source}")]
    Decompression {
        format: &'static str,
        source: io::Error,
    },

    #[error("Failed to compress {format} data: {source}")]
    Compression {
        format: &'static str,
        source: io::Error,
    },
}

/// Outer compression layer of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// No outer compression (raw data)
    None,
    /// Gzip compression
    Gzip,
}

impl CompressionFormat {
    /// Detect compression format from magic bytes
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() >= 2 && data[..2] == GZIP_MAGIC {
            Self::Gzip
        } else {
            Self::None
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
        }
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Read up to the first two bytes of a file
///
/// Short files yield fewer bytes rather than an error.
pub fn read_magic(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut magic = Vec::with_capacity(2);
    (&mut file).take(2).read_to_end(&mut magic)?;
    Ok(magic)
}

/// Decompress a gzip file into `dest`
///
/// Concatenated gzip members are decoded as one stream. Returns the number
/// of decompressed bytes written.
pub fn gunzip_file(src: &Path, dest: &Path) -> Result<u64, CompressionError> {
    let input = File::open(src).map_err(|e| CompressionError::Open {
        path: src.display().to_string(),
        source: e,
    })?;
    let output = File::create(dest).map_err(|e| CompressionError::Open {
        path: dest.display().to_string(),
        source: e,
    })?;

    let mut decoder = MultiGzDecoder::new(BufReader::new(input));
    let mut writer = BufWriter::new(output);
    let written = io::copy(&mut decoder, &mut writer).map_err(|e| {
        CompressionError::Decompression {
            format: "gzip",
            source: e,
        }
    })?;
    writer.flush().map_err(|e| CompressionError::Decompression {
        format: "gzip",
        source: e,
    })?;
    Ok(written)
}

/// Gzip-compress `src` into `dest` at maximum compression
pub fn gzip_file(src: &Path, dest: &Path) -> Result<(), CompressionError> {
    let input = File::open(src).map_err(|e| CompressionError::Open {
        path: src.display().to_string(),
        source: e,
    })?;
    let output = File::create(dest).map_err(|e| CompressionError::Open {
        path: dest.display().to_string(),
        source: e,
    })?;

    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::best());
    io::copy(&mut BufReader::new(input), &mut encoder).map_err(|e| {
        CompressionError::Compression {
            format: "gzip",
            source: e,
        }
    })?;
    let mut writer = encoder.finish().map_err(|e| CompressionError::Compression {
        format: "gzip",
        source: e,
    })?;
    writer.flush().map_err(|e| CompressionError::Compression {
        format: "gzip",
        source: e,
    })?;
    Ok(())
}
