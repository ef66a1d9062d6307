//! Template asset checks
//!
//! Inspects the files that make up a template bundle: the required-file gate
//! (`metadata.json`, `template.zip`), the optional `preview.png`, size
//! thresholds and binary signatures. Signature checks only read the leading
//! bytes of a file; every handle is dropped at the end of its check.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

use crate::util::format_file_size;
use crate::validator::ValidationIssue;

pub const METADATA_FILE: &str = "metadata.json";
pub const ARCHIVE_FILE: &str = "template.zip";
pub const PREVIEW_FILE: &str = "preview.png";

/// Archives above this size draw a warning (50 MiB)
pub const MAX_ARCHIVE_BYTES: u64 = 50 * 1024 * 1024;

/// Previews above this size draw a warning (5 MiB)
pub const MAX_PREVIEW_BYTES: u64 = 5 * 1024 * 1024;

/// ZIP local file header, `0x04034b50` little-endian
pub const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Read at most `len` bytes from the start of a file
///
/// Returns fewer bytes when the file is shorter. The rest of the file is
/// never read.
pub fn read_header(path: &Path, len: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(len);
    file.take(len as u64).read_to_end(&mut header)?;
    Ok(header)
}

/// Whether the file at `path` starts with `signature`
pub fn has_signature(path: &Path, signature: &[u8]) -> io::Result<bool> {
    let header = read_header(path, signature.len())?;
    Ok(header == signature)
}

/// Check that the files needed to publish a template exist
///
/// Missing `metadata.json` or `template.zip` is an error and the caller
/// should skip the template. A missing preview only warns.
pub fn check_required_files(template_dir: &Path) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !template_dir.join(METADATA_FILE).is_file() {
        issues.push(ValidationIssue::error(
            "required-file",
            None,
            format!("Missing {METADATA_FILE}"),
        ));
    }

    if !template_dir.join(ARCHIVE_FILE).is_file() {
        issues.push(ValidationIssue::error(
            "required-file",
            None,
            format!("Missing {ARCHIVE_FILE}"),
        ));
    }

    if !template_dir.join(PREVIEW_FILE).is_file() {
        issues.push(ValidationIssue::warning(
            "preview-missing",
            None,
            format!("Missing {PREVIEW_FILE} (recommended)"),
        ));
    }

    issues
}

/// Check the archive's size and ZIP signature
pub fn check_archive(template_dir: &Path) -> Vec<ValidationIssue> {
    let path = template_dir.join(ARCHIVE_FILE);
    let mut issues = Vec::new();

    let size = match std::fs::metadata(&path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            issues.push(read_error(ARCHIVE_FILE, &e));
            return issues;
        }
    };
    debug!("{} is {}", path.display(), format_file_size(size));

    if size > MAX_ARCHIVE_BYTES {
        issues.push(ValidationIssue::warning(
            "archive-size",
            None,
            format!("Template ZIP is quite large ({})", format_file_size(size)),
        ));
    }

    match has_signature(&path, &ZIP_SIGNATURE) {
        Ok(true) => {}
        Ok(false) => issues.push(ValidationIssue::error(
            "archive-signature",
            None,
            format!("{ARCHIVE_FILE} does not appear to be a valid ZIP file"),
        )),
        Err(e) => issues.push(read_error(ARCHIVE_FILE, &e)),
    }

    issues
}

/// Check the preview's size and PNG signature, if a preview exists
pub fn check_preview(template_dir: &Path) -> Vec<ValidationIssue> {
    let path = template_dir.join(PREVIEW_FILE);
    let mut issues = Vec::new();

    if !path.is_file() {
        return issues;
    }

    let size = match std::fs::metadata(&path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            issues.push(read_error(PREVIEW_FILE, &e));
            return issues;
        }
    };

    if size > MAX_PREVIEW_BYTES {
        issues.push(ValidationIssue::warning(
            "preview-size",
            None,
            format!(
                "Preview image is quite large ({}), consider optimizing",
                format_file_size(size)
            ),
        ));
    }

    match has_signature(&path, &PNG_SIGNATURE) {
        Ok(true) => {}
        Ok(false) => issues.push(ValidationIssue::error(
            "preview-signature",
            None,
            format!("{PREVIEW_FILE} is not a valid PNG file"),
        )),
        Err(e) => issues.push(read_error(PREVIEW_FILE, &e)),
    }

    issues
}

/// Run every asset check for a template directory
///
/// When the required-file gate reports an error the remaining checks are
/// skipped, matching what the builder does.
pub fn check_assets(template_dir: &Path, template_id: &str) -> Vec<ValidationIssue> {
    debug!("Checking assets for template '{}'", template_id);

    let mut issues = check_required_files(template_dir);
    if issues.iter().any(ValidationIssue::is_error) {
        return issues;
    }

    issues.extend(check_archive(template_dir));
    issues.extend(check_preview(template_dir));
    issues
}

fn read_error(file: &str, err: &io::Error) -> ValidationIssue {
    ValidationIssue::error("asset-read", None, format!("Error reading {file}: {err}"))
}
