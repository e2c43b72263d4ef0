// src/filesystem/mod.rs

//! Filesystem helpers shared by extraction and repackaging

pub mod path;

pub use path::{archive_entry_name, sanitize_entry_name, sanitize_filename};
