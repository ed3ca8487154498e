//! Temporary storage for uploaded documents.
//!
//! Uploads are written to a uniquely named file in the staging directory
//! and removed when the returned handle drops, whatever the outcome.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

const STAGING_PREFIX: &str = "upload-";

/// PDF magic bytes.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.len() >= 5 && &bytes[0..5] == b"%PDF-"
}

/// Write an upload to a fresh staging file.
pub fn stage_upload(staging_dir: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    fs::create_dir_all(staging_dir)?;
    let mut file = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(".pdf")
        .tempfile_in(staging_dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

/// Remove staged uploads left behind by a previous run.
///
/// Called at startup. Returns the number of files removed.
pub fn cleanup_orphaned_staging(staging_dir: &Path) -> usize {
    let entries = match fs::read_dir(staging_dir) {
        Ok(e) => e,
        Err(_) => return 0, // Staging dir may not exist yet
    };

    let mut count = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let staged = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(STAGING_PREFIX));
        if !staged || !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => count += 1,
            Err(e) => tracing::warn!("Failed to clean staging file: {e}"),
        }
    }

    if count > 0 {
        tracing::info!(files_cleaned = count, "Cleaned orphaned staging files from previous run");
    }
    count
}

/// Sanitize a client-supplied filename for use in a download name.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "");
    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() {
        "document".into()
    } else {
        sanitized
    }
}

/// `rapport.pdf` → `rapport_extraction.<ext>`.
pub fn download_filename(original: &str, extension: &str) -> String {
    let safe = sanitize_filename(original);
    let stem = safe
        .strip_suffix(".pdf")
        .or_else(|| safe.strip_suffix(".PDF"))
        .unwrap_or(&safe);
    format!("{stem}_extraction.{extension}")
}
