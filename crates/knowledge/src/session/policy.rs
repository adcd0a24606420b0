//! Upload acceptance rules.

use super::events::FileUpload;
use easydocs_core::config::UploadSettings;
use easydocs_core::{AppError, AppResult};

const MIB: u64 = 1024 * 1024;

/// Which uploads are accepted. Checked before any extraction work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub accepted_mime_type: String,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from_settings(&UploadSettings::default())
    }
}

impl UploadPolicy {
    pub fn from_settings(settings: &UploadSettings) -> Self {
        Self {
            accepted_mime_type: settings.accepted_mime_type.to_ascii_lowercase(),
            max_bytes: settings.max_bytes,
        }
    }

    /// Reject uploads of the wrong type, empty files, and oversized files.
    pub fn check(&self, upload: &FileUpload) -> AppResult<()> {
        let mime = upload.effective_mime_type();
        if mime != self.accepted_mime_type {
            tracing::warn!("Rejected upload {}: type {}", upload.name, mime);
            return Err(AppError::Validation(format!(
                "Sorry, I can only read PDF files. '{}' looks like {}.",
                upload.name, mime
            )));
        }

        let size = upload.bytes.len() as u64;
        if size == 0 {
            return Err(AppError::Validation(format!("'{}' is empty.", upload.name)));
        }

        if size > self.max_bytes {
            tracing::warn!("Rejected upload {}: {} bytes", upload.name, size);
            return Err(AppError::Validation(format!(
                "Sorry, '{}' is too large ({:.1} MB). The limit is {} MB.",
                upload.name,
                size as f64 / MIB as f64,
                self.max_bytes / MIB
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.accepted_mime_type, "application/pdf");
        assert_eq!(policy.max_bytes, 20 * MIB);
    }

    #[test]
    fn test_accepts_pdf_within_limit() {
        let upload = FileUpload::new("lease.pdf", vec![0; 1024], "application/pdf");
        assert!(UploadPolicy::default().check(&upload).is_ok());
    }

    #[test]
    fn test_rejects_docx() {
        let upload = FileUpload::new("report.docx", vec![0; 10], "");
        let err = UploadPolicy::default().check(&upload).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("only read PDF")));
    }

    #[test]
    fn test_rejects_oversized_pdf() {
        let upload = FileUpload::new("big.pdf", vec![0; (20 * MIB + 1) as usize], "application/pdf");
        let err = UploadPolicy::default().check(&upload).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("too large")));
    }

    #[test]
    fn test_exact_limit_is_accepted() {
        let policy = UploadPolicy {
            accepted_mime_type: "application/pdf".to_string(),
            max_bytes: 16,
        };
        assert!(policy.check(&FileUpload::new("a.pdf", vec![0; 16], "")).is_ok());
        assert!(policy.check(&FileUpload::new("a.pdf", vec![0; 17], "")).is_err());
    }

    #[test]
    fn test_rejects_empty_file() {
        let upload = FileUpload::new("empty.pdf", Vec::new(), "application/pdf");
        assert!(UploadPolicy::default().check(&upload).is_err());
    }
}
