//! Upload command handler.

use clap::Args;
use easydocs_core::{config::AppConfig, AppResult};
use easydocs_knowledge::session::upload_summary;
use easydocs_knowledge::{FileUpload, Mode, Pipeline};
use std::path::PathBuf;

/// Upload a PDF into the search index
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl UploadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing upload command for {:?}", self.path);

        let pipeline = Pipeline::from_config(config)?;
        let upload = FileUpload::from_path(&self.path).await?;
        let report = pipeline.session(Mode::Ask).upload(upload).await?;

        if self.json {
            let failed: Vec<_> = report
                .failed
                .iter()
                .map(|(id, reason)| serde_json::json!({ "id": id, "reason": reason }))
                .collect();
            let output = serde_json::json!({
                "title": report.title,
                "digest": report.digest,
                "chunks": report.chunks,
                "written": report.written,
                "skipped": report.skipped,
                "failed": failed,
                "ingestedAt": report.ingested_at.to_rfc3339(),
                "durationSecs": report.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", upload_summary(&report));
            for (id, reason) in &report.failed {
                eprintln!("  failed {}: {}", id, reason);
            }
        }

        Ok(())
    }
}
