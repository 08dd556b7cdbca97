//! Read-only ZIP archive inspection.

use std::io::Cursor;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::error::ArchiveError;
use crate::models::config::SUPPORTED_EXTENSIONS;

/// Returns true when the filename carries a supported document
/// extension, case-insensitively.
pub fn is_supported_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Count the archive entries that look like processable documents.
///
/// Directory pseudo-entries are skipped and matching is by filename
/// extension only; entry contents are never decompressed. A container
/// that cannot be parsed surfaces as [`ArchiveError::Unreadable`].
pub fn inspect_archive(bytes: &[u8]) -> Result<usize, ArchiveError> {
    let archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveError::Unreadable(e.to_string()))?;

    let valid = archive
        .file_names()
        .filter(|name| !name.ends_with('/') && is_supported_name(name))
        .count();

    debug!(valid, total = archive.len(), "inspected archive");

    Ok(valid)
}
