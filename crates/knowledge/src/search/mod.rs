//! Search index abstraction for document chunks.
//!
//! A [`SearchIndex`] backend stores chunk records with vectors and answers
//! hybrid (keyword + vector) queries. The [`IndexClient`] sits in front of
//! it: records without a vector never reach the backend, and per-record
//! outcomes are collected into an [`UpsertReport`].

pub mod azure;
pub mod memory;

pub use azure::AzureSearchIndex;
pub use memory::MemoryIndex;

use crate::types::IndexRecord;
use easydocs_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A record ready for the backend; the vector is guaranteed present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub vector: Vec<f32>,
}

/// Backend acknowledgement for a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordAck {
    pub id: String,
    pub written: bool,
    pub message: Option<String>,
}

impl RecordAck {
    pub fn written(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            written: true,
            message: None,
        }
    }

    pub fn rejected(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            written: false,
            message: Some(message.into()),
        }
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub content: String,
    pub score: f32,
}

/// Trait for search index backends.
#[async_trait::async_trait]
pub trait SearchIndex: Send + Sync {
    /// Backend name for logs (e.g. "azure", "memory").
    fn name(&self) -> &str;

    /// Insert or replace records, keyed by id.
    async fn upsert(&self, records: &[VectorRecord]) -> AppResult<Vec<RecordAck>>;

    /// Combined keyword and vector search, best match first, at most `k` hits.
    async fn hybrid_search(&self, query: &str, vector: &[f32], k: usize)
        -> AppResult<Vec<SearchHit>>;

    /// Create the backing index if the backend needs one. Returns true when
    /// something was created.
    async fn ensure_index(&self) -> AppResult<bool> {
        Ok(false)
    }
}

/// Outcome of an upsert call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertReport {
    /// Ids the backend accepted
    pub written: Vec<String>,

    /// Ids never submitted because they had no vector
    pub skipped: Vec<String>,

    /// Ids the backend rejected, with its reason
    pub failed: Vec<(String, String)>,
}

/// Front-end over a [`SearchIndex`] backend.
#[derive(Clone)]
pub struct IndexClient {
    index: Arc<dyn SearchIndex>,
}

impl IndexClient {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    pub fn backend(&self) -> &Arc<dyn SearchIndex> {
        &self.index
    }

    /// Submit records that carry a vector; report the rest as skipped.
    ///
    /// # Errors
    /// Returns `AppError::Provider` when the backend call itself fails.
    pub async fn upsert(&self, records: Vec<IndexRecord>) -> AppResult<UpsertReport> {
        let mut report = UpsertReport::default();
        let mut submit = Vec::with_capacity(records.len());

        for record in records {
            match record.vector {
                Some(vector) => submit.push(VectorRecord {
                    id: record.id,
                    title: record.title,
                    content: record.content,
                    vector,
                }),
                None => report.skipped.push(record.id),
            }
        }

        if !report.skipped.is_empty() {
            tracing::warn!(
                "Skipping {} records without embeddings",
                report.skipped.len()
            );
        }

        if submit.is_empty() {
            return Ok(report);
        }

        tracing::info!(
            "Upserting {} records into '{}' index",
            submit.len(),
            self.index.name()
        );

        let acks = self.index.upsert(&submit).await?;

        for record in &submit {
            match acks.iter().find(|ack| ack.id == record.id) {
                Some(ack) if ack.written => report.written.push(record.id.clone()),
                Some(ack) => {
                    let reason = ack
                        .message
                        .clone()
                        .unwrap_or_else(|| "rejected".to_string());
                    tracing::warn!("Index rejected record {}: {}", record.id, reason);
                    report.failed.push((record.id.clone(), reason));
                }
                None => {
                    tracing::warn!("Index did not acknowledge record {}", record.id);
                    report
                        .failed
                        .push((record.id.clone(), "not acknowledged".to_string()));
                }
            }
        }

        tracing::debug!(
            "Upsert finished: {} written, {} skipped, {} failed",
            report.written.len(),
            report.skipped.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Hybrid search returning the text of at most `k` hits in rank order.
    pub async fn hybrid_search(&self, query: &str, vector: &[f32], k: usize) -> AppResult<Vec<String>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let hits = self.index.hybrid_search(query, vector, k).await?;
        tracing::debug!(
            "Index '{}' returned {} hits (scores: {:?})",
            self.index.name(),
            hits.len(),
            hits.iter().map(|h| h.score).collect::<Vec<_>>()
        );

        Ok(hits.into_iter().take(k).map(|hit| hit.content).collect())
    }
}

/// Create the search backend named by the `search` config section.
pub fn create_index(config: &AppConfig, api_key: Option<&str>) -> AppResult<Arc<dyn SearchIndex>> {
    let settings = &config.search;

    match settings.provider.as_str() {
        "memory" => Ok(Arc::new(MemoryIndex::new())),
        "azure" => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                AppError::Config("Azure search provider requires an endpoint".to_string())
            })?;
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Azure search provider requires API key".to_string())
            })?;
            let index = AzureSearchIndex::new(
                endpoint,
                api_key,
                settings,
                config.embedding.dimensions,
                Duration::from_secs(config.llm.timeout),
            )?;
            Ok(Arc::new(index))
        }
        other => Err(AppError::Config(format!(
            "Unknown search provider: '{}'. Supported providers: azure, memory",
            other
        ))),
    }
}

/// Cosine similarity of two vectors; 0.0 when lengths differ or either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
