//! Azure OpenAI embedding provider.
//!
//! Calls `POST {endpoint}/openai/deployments/{deployment}/embeddings` with
//! the `api-key` header and a batch `input` array.

use crate::embeddings::EmbeddingProvider;
use easydocs_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const PROVIDER: &str = "azure";

/// Azure OpenAI embeddings client.
#[derive(Debug, Clone)]
pub struct AzureEmbeddingProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl AzureEmbeddingProvider {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        api_version: &str,
        deployment: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::provider(PROVIDER, format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
            deployment: deployment.to_string(),
            dimensions,
        })
    }

    fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

/// Order items by input index and keep the leading run without gaps.
///
/// Anything after the first missing index cannot be attributed to an input
/// position, so it is dropped and reported as missing by the caller.
fn ordered_vectors(mut items: Vec<EmbeddingItem>, expected: usize) -> Vec<Vec<f32>> {
    items.sort_by_key(|item| item.index);

    let mut vectors = Vec::with_capacity(items.len().min(expected));
    for item in items {
        if item.index != vectors.len() || item.index >= expected {
            break;
        }
        vectors.push(item.embedding);
    }
    vectors
}

#[async_trait::async_trait]
impl EmbeddingProvider for AzureEmbeddingProvider {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.deployment
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), deployment = %self.deployment))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(self.embeddings_url())
            .header("api-key", &self.api_key)
            .json(&EmbeddingsRequest { input: texts })
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::provider(
                PROVIDER,
                format!("API error ({}): {}", status, error_text),
            ));
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
            AppError::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        let vectors = ordered_vectors(parsed.data, texts.len());
        debug!("Azure returned {} of {} embeddings", vectors.len(), texts.len());
        Ok(vectors)
    }
}
