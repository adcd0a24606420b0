//! Document ingestion: extract, chunk, embed, index.

use crate::chunker::RecursiveChunker;
use crate::embeddings::Embedder;
use crate::parser;
use crate::search::IndexClient;
use crate::types::{Document, IndexRecord, IngestReport};
use chrono::Utc;
use easydocs_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Instant;

/// Anything that can take an accepted upload into the index.
#[async_trait::async_trait]
pub trait DocumentIngest: Send + Sync {
    async fn ingest(&self, document: &Document) -> AppResult<IngestReport>;
}

/// Runs the ingestion pipeline for one document at a time.
///
/// Re-ingesting a document appends a new set of records; nothing is
/// de-duplicated.
#[derive(Clone)]
pub struct Ingestor {
    chunker: RecursiveChunker,
    embedder: Arc<Embedder>,
    index: Arc<IndexClient>,
}

impl Ingestor {
    pub fn new(chunker: RecursiveChunker, embedder: Arc<Embedder>, index: Arc<IndexClient>) -> Self {
        Self {
            chunker,
            embedder,
            index,
        }
    }

    /// Chunk, embed and index already-extracted text.
    pub async fn ingest_text(&self, title: &str, digest: &str, text: &str) -> AppResult<IngestReport> {
        let start = Instant::now();

        let chunks = self.chunker.chunk(title, text);
        if chunks.is_empty() {
            return Err(AppError::Extraction(format!("{} contains no text", title)));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_texts(&texts).await?;

        let records: Vec<IndexRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexRecord::from_chunk(chunk, vector))
            .collect();

        let upsert = self.index.upsert(records).await?;
        let duration = start.elapsed();

        tracing::info!(
            "Ingested '{}': {} chunks, {} written, {} skipped, {} failed in {:.2}s",
            title,
            chunks.len(),
            upsert.written.len(),
            upsert.skipped.len(),
            upsert.failed.len(),
            duration.as_secs_f64()
        );

        Ok(IngestReport {
            title: title.to_string(),
            digest: digest.to_string(),
            chunks: chunks.len(),
            written: upsert.written,
            skipped: upsert.skipped,
            failed: upsert.failed,
            ingested_at: Utc::now(),
            duration_secs: duration.as_secs_f64(),
        })
    }
}

#[async_trait::async_trait]
impl DocumentIngest for Ingestor {
    async fn ingest(&self, document: &Document) -> AppResult<IngestReport> {
        tracing::info!("Ingesting {} ({} bytes)", document.name, document.size_bytes());

        let text = parser::extract_text(document)?;
        self.ingest_text(&document.name, &document.digest(), &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MemoryIndex;
    use crate::tests::fakes::FakeEmbeddings;

    fn ingestor(embeddings: FakeEmbeddings) -> (Ingestor, Arc<MemoryIndex>) {
        let memory = Arc::new(MemoryIndex::new());
        let ingestor = Ingestor::new(
            RecursiveChunker::new(80, 20).unwrap(),
            Arc::new(Embedder::new(Arc::new(embeddings), 4)),
            Arc::new(IndexClient::new(memory.clone())),
        );
        (ingestor, memory)
    }

    fn lease_text() -> String {
        "The tenant pays rent on the first day of every month. ".repeat(12)
    }

    #[tokio::test]
    async fn test_ingest_text_writes_every_chunk() {
        let (ingestor, memory) = ingestor(FakeEmbeddings::new(16));
        let report = ingestor.ingest_text("lease.pdf", "abc", &lease_text()).await.unwrap();

        assert!(report.chunks > 1);
        assert_eq!(report.written.len(), report.chunks);
        assert!(report.is_complete());
        assert_eq!(memory.len(), report.chunks);
    }

    #[tokio::test]
    async fn test_missing_vectors_are_counted_as_skipped() {
        let (ingestor, memory) = ingestor(FakeEmbeddings::new(16).dropping_last(1));
        let report = ingestor.ingest_text("lease.pdf", "abc", &lease_text()).await.unwrap();

        let batches = report.chunks.div_ceil(4);
        assert_eq!(report.skipped.len(), batches);
        assert_eq!(report.written.len(), report.chunks - batches);
        assert_eq!(memory.len(), report.written.len());
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_reingest_appends_new_records() {
        let (ingestor, memory) = ingestor(FakeEmbeddings::new(16));
        let first = ingestor.ingest_text("lease.pdf", "abc", &lease_text()).await.unwrap();
        let second = ingestor.ingest_text("lease.pdf", "abc", &lease_text()).await.unwrap();

        assert_eq!(memory.len(), first.chunks + second.chunks);
        assert!(first.written.iter().all(|id| !second.written.contains(id)));
    }

    #[tokio::test]
    async fn test_embedding_failure_fails_ingest() {
        let (ingestor, memory) = ingestor(FakeEmbeddings::new(16).failing());
        let result = ingestor.ingest_text("lease.pdf", "abc", &lease_text()).await;

        assert!(matches!(result, Err(AppError::Provider { .. })));
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_extraction_error() {
        let (ingestor, _) = ingestor(FakeEmbeddings::new(16));
        let doc = Document::new("scan.pdf", b"%PDF-garbage".to_vec(), "application/pdf");
        assert!(matches!(
            ingestor.ingest(&doc).await,
            Err(AppError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn test_ingest_pdf_indexes_extracted_text() {
        let (ingestor, memory) = ingestor(FakeEmbeddings::new(16));
        let doc = Document::new("lease.pdf", crate::tests::LEASE_PDF.to_vec(), "application/pdf");

        let report = ingestor.ingest(&doc).await.unwrap();

        assert_eq!(report.title, "lease.pdf");
        assert_eq!(report.digest, doc.digest());
        assert!(report.chunks >= 1);
        assert!(report.is_complete());
        assert_eq!(memory.len(), report.chunks);
    }
}
