//! Document text extraction.

use crate::types::Document;
use easydocs_core::{AppError, AppResult};

/// Extract plain text from an uploaded PDF.
///
/// Returns `AppError::Extraction` when the bytes cannot be parsed or the
/// document contains no text layer (e.g. a scanned image).
pub fn extract_text(document: &Document) -> AppResult<String> {
    tracing::debug!(
        "Extracting text from {} ({} bytes)",
        document.name,
        document.bytes.len()
    );

    // pdf-extract panics on some malformed inputs
    let bytes = document.bytes.as_slice();
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| {
            AppError::Extraction(format!("PDF parser crashed on {}", document.name))
        })?
        .map_err(|e| AppError::Extraction(format!("{}: {}", document.name, e)))?;

    let text = normalize_text(&extracted);
    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!(
            "{} contains no extractable text",
            document.name
        )));
    }

    tracing::debug!("Extracted {} characters from {}", text.chars().count(), document.name);
    Ok(text)
}

/// Normalize line endings and page breaks, trim trailing spaces, and
/// collapse runs of blank lines into a single paragraph break.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{c}', "\n\n");

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0;

    for line in unified.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }

        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }

    out
}
