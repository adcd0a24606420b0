//! Question-to-context retrieval.

use crate::embeddings::Embedder;
use crate::search::IndexClient;
use crate::types::RetrievedContext;
use easydocs_core::AppResult;
use std::sync::Arc;

/// Number of chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Embeds a question and runs a hybrid search for it.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<Embedder>,
    index: Arc<IndexClient>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<Embedder>, index: Arc<IndexClient>) -> Self {
        Self {
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve up to the configured number of chunks for `query`.
    pub async fn retrieve(&self, query: &str) -> AppResult<RetrievedContext> {
        self.retrieve_top(query, self.top_k).await
    }

    /// Retrieve up to `k` chunks for `query`, best first.
    ///
    /// An empty context is a normal outcome, not an error.
    pub async fn retrieve_top(&self, query: &str, k: usize) -> AppResult<RetrievedContext> {
        tracing::info!("Retrieving top {} chunks for query: {}", k, query);

        let vector = self.embedder.embed_query(query).await?;
        let chunks = self.index.hybrid_search(query, &vector, k).await?;

        if chunks.is_empty() {
            tracing::info!("No chunks matched the query");
        } else {
            tracing::debug!("Retrieved {} chunks", chunks.len());
        }

        Ok(RetrievedContext::new(query, chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MemoryIndex;
    use crate::tests::fakes::{seeded_index, FakeEmbeddings};

    fn retriever(index: Arc<IndexClient>) -> Retriever {
        let embedder = Arc::new(Embedder::new(Arc::new(FakeEmbeddings::new(64)), 8));
        Retriever::new(embedder, index)
    }

    #[tokio::test]
    async fn test_returns_at_most_top_k() {
        let index = seeded_index(64, &[
            "Rent is due on the first of the month.",
            "Rent increases are capped at three percent.",
            "Late rent incurs a fee.",
            "Rent is paid by bank transfer.",
            "The tenant keeps pets only with consent.",
        ])
        .await;

        let context = retriever(index).retrieve("rent").await.unwrap();
        assert_eq!(context.len(), DEFAULT_TOP_K);
        assert_eq!(context.query, "rent");
    }

    #[tokio::test]
    async fn test_empty_index_gives_empty_context() {
        let index = Arc::new(IndexClient::new(Arc::new(MemoryIndex::new())));
        let context = retriever(index).retrieve("anything").await.unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_custom_top_k() {
        let index = seeded_index(64, &["Notice period is sixty days.", "Notice must be written."]).await;
        let context = retriever(index)
            .with_top_k(1)
            .retrieve("notice")
            .await
            .unwrap();
        assert_eq!(context.len(), 1);
    }
}
