//! Simplify command handler.

use clap::Args;
use easydocs_core::{config::AppConfig, AppError, AppResult};
use easydocs_knowledge::{FileUpload, Pipeline};
use std::path::PathBuf;

/// Rewrite text in plain language
#[derive(Args, Debug)]
pub struct SimplifyCommand {
    /// Text to simplify
    pub text: Option<String>,

    /// Read the text from a file; PDFs are extracted first
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

impl SimplifyCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing simplify command");

        let text = self.input_text().await?;
        let pipeline = Pipeline::from_config(config)?;

        let simplified = pipeline.simplifier.simplify(&text).await?;
        println!("{}", simplified);

        Ok(())
    }

    async fn input_text(&self) -> AppResult<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }

        let path = self
            .file
            .as_ref()
            .ok_or_else(|| AppError::Validation("Provide text or --file".to_string()))?;

        let upload = FileUpload::from_path(path).await?;
        if upload.effective_mime_type() == "application/pdf" {
            return easydocs_knowledge::parser::extract_text(&upload.into_document());
        }

        String::from_utf8(upload.bytes)
            .map_err(|_| AppError::Validation(format!("{:?} is not a text or PDF file", path)))
    }
}
