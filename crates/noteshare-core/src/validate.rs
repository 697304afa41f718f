//! Upload validation for incoming PDF documents.
//!
//! Three layers, all local (no rejection here ever touches the network):
//! 1. Claimed MIME type / filename extension check
//! 2. Size ceiling with the overage reported in MB
//! 3. Magic byte sniffing to catch mislabeled binaries

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::defaults::PDF_CONTENT_TYPE;
use crate::error::{Error, Result};

/// A file selected for upload, before any validation.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Accept `application/pdf` MIME or a `.pdf` filename, matching the file
/// picker contract. Either signal suffices.
pub fn looks_like_pdf(name: &str, content_type: &str) -> bool {
    content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
        || name.to_lowercase().ends_with(".pdf")
}

/// Validate a selected file against the PDF-only policy and size ceiling.
///
/// Rejections carry the user-facing message; the byte overage is reported as
/// megabytes with two decimals (a 52 MiB file against a 50 MiB ceiling is
/// "over by 2.00 MB").
pub fn validate_upload(file: &SelectedFile, max_bytes: u64) -> Result<()> {
    if file.bytes.is_empty() {
        return Err(Error::Validation("Please select a PDF to upload.".into()));
    }

    if !looks_like_pdf(&file.name, &file.content_type) {
        return Err(Error::Validation("Only PDF files are allowed.".into()));
    }

    if file.size() > max_bytes {
        let over_by = (file.size() - max_bytes) as f64 / (1024.0 * 1024.0);
        let max_mb = max_bytes / (1024 * 1024);
        return Err(Error::Validation(format!(
            "File is too large. Maximum allowed is {} MB (over by {:.2} MB).",
            max_mb, over_by
        )));
    }

    // Magic byte check: a file claiming to be a PDF must actually start with
    // one. Sniffing failures on an explicit PDF claim mean mislabeled data.
    if let Some(kind) = infer::get(&file.bytes) {
        if kind.mime_type() != PDF_CONTENT_TYPE {
            return Err(Error::Validation(format!(
                "File content is {} rather than a PDF.",
                kind.mime_type()
            )));
        }
    } else if !file.bytes.starts_with(b"%PDF-") {
        return Err(Error::Validation(
            "File content does not look like a PDF.".into(),
        ));
    }

    Ok(())
}

/// Sanitize a filename for safe storage keys.
///
/// Path components are stripped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return "document.pdf".to_string();
    }

    sanitized
}

/// Derive the storage key for an upload.
///
/// Pattern: `{user_id}/{yyyy}/{mm}/{timestamp_ms}_{sanitized_name}` — the
/// timestamp prefix avoids collisions and the user prefix makes object
/// ownership auditable from the path alone.
pub fn storage_key(user_id: Uuid, at: DateTime<Utc>, filename: &str) -> String {
    format!(
        "{}/{:04}/{:02}/{}_{}",
        user_id,
        at.year(),
        at.month(),
        at.timestamp_millis(),
        sanitize_filename(filename)
    )
}
