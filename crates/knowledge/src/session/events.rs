//! Inbound session events.

use crate::types::Document;
use easydocs_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A file delivered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUpload {
    pub name: String,

    pub bytes: Vec<u8>,

    /// Declared MIME type; detected from the name when empty
    #[serde(default, alias = "mimeType")]
    pub mime_type: String,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = detect_mime(&name);
        Ok(Self::new(name, bytes, mime_type))
    }

    /// Declared MIME type, or the one implied by the file name.
    pub fn effective_mime_type(&self) -> String {
        if self.mime_type.trim().is_empty() {
            detect_mime(&self.name)
        } else {
            self.mime_type.trim().to_ascii_lowercase()
        }
    }

    pub fn into_document(self) -> Document {
        let mime_type = self.effective_mime_type();
        Document::new(self.name, self.bytes, mime_type)
    }
}

/// MIME type implied by a file name's extension.
pub fn detect_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Something the user sent to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundEvent {
    Text { text: String },
    File(FileUpload),
}

impl InboundEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Decode a JSON event such as `{"type":"text","text":"..."}`.
    pub fn decode(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Validation(format!("Unrecognized message: {}", e)))
    }
}
