//! Embedding of chunk texts and queries.
//!
//! The [`Embedder`] wraps a provider, batches requests, and maps the
//! provider's output back onto input positions. A position the provider
//! did not answer (short response, wrong dimensions) becomes `None` so the
//! caller can skip that chunk and keep the rest.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use easydocs_core::{AppError, AppResult};
use std::sync::Arc;

/// Batching front-end over an [`EmbeddingProvider`].
#[derive(Debug, Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed texts, returning one entry per input in input order.
    ///
    /// Missing vectors are `None`. A provider error on any batch fails the
    /// whole call.
    pub async fn embed_texts(&self, texts: &[String]) -> AppResult<Vec<Option<Vec<f32>>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            "Embedding {} texts with provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let returned = self.provider.embed_batch(batch).await?;

            if returned.len() > batch.len() {
                return Err(AppError::provider(
                    self.provider.provider_name(),
                    format!(
                        "Returned {} embeddings for {} inputs",
                        returned.len(),
                        batch.len()
                    ),
                ));
            }

            if returned.len() < batch.len() {
                let partial = AppError::PartialResult {
                    expected: batch.len(),
                    received: returned.len(),
                };
                tracing::warn!("Embedding batch incomplete: {}", partial);
            }

            let mut returned = returned.into_iter();
            for _ in batch {
                vectors.push(returned.next().and_then(|v| self.check_dimensions(v)));
            }
        }

        let missing = vectors.iter().filter(|v| v.is_none()).count();
        tracing::debug!(
            "Generated {} embeddings ({} missing)",
            vectors.len() - missing,
            missing
        );

        Ok(vectors)
    }

    /// Embed a single query.
    ///
    /// # Errors
    /// `AppError::PartialResult` when the provider returns no usable vector.
    pub async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_texts(&[query.to_string()]).await?;
        vectors
            .pop()
            .flatten()
            .ok_or(AppError::PartialResult {
                expected: 1,
                received: 0,
            })
    }

    fn check_dimensions(&self, vector: Vec<f32>) -> Option<Vec<f32>> {
        let expected = self.provider.dimensions();
        if vector.len() == expected {
            Some(vector)
        } else {
            tracing::warn!(
                "Discarding embedding with {} dimensions (expected {})",
                vector.len(),
                expected
            );
            None
        }
    }
}
