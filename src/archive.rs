//! Packs TMDL files into a single zip archive for upload.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::models::TmdlFiles;

/// Internal precondition and I/O failures of [`pack`].
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No file collection was supplied.
    #[error("files collection cannot be null")]
    NullInput,
    /// The file collection has no entries.
    #[error("files collection cannot be empty")]
    EmptyInput,
    /// The zip writer rejected an entry.
    #[error("failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// Writing entry content failed.
    #[error("failed to write archive entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Pack `files` into an in-memory zip archive.
///
/// Each key becomes an entry name verbatim and each value is stored as UTF-8.
/// Entries are written in key order with a fixed timestamp, so the same input
/// always yields the same bytes.
pub fn pack(files: Option<&TmdlFiles>) -> Result<Vec<u8>, ArchiveError> {
    let files = files.ok_or(ArchiveError::NullInput)?;
    if files.is_empty() {
        return Err(ArchiveError::EmptyInput);
    }

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in files {
        writer.start_file(path.as_str(), options)?;
        writer.write_all(content.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}
