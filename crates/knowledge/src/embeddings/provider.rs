//! Embedding provider trait and factory.

use super::providers::{AzureEmbeddingProvider, MockProvider, OllamaProvider};
use easydocs_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
///
/// `embed_batch` returns vectors in input order. A provider may return
/// fewer vectors than inputs; the [`Embedder`](super::Embedder) treats the
/// missing tail as unembedded rather than failing the whole batch.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "azure", "ollama", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;
}

/// Create the embedding provider named by the `embedding` config section.
///
/// The Azure provider reuses the completion endpoint and API version
/// unless an embedding endpoint is configured.
pub fn create_provider(
    config: &AppConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let settings = &config.embedding;
    let timeout = Duration::from_secs(config.llm.timeout);

    match settings.provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(settings.dimensions))),

        "ollama" => {
            let provider = OllamaProvider::new(
                settings.endpoint.as_deref(),
                &settings.model,
                settings.dimensions,
                timeout,
            )?;
            Ok(Arc::new(provider))
        }

        "azure" => {
            let endpoint = config.embedding_endpoint().ok_or_else(|| {
                AppError::Config("Azure embedding provider requires an endpoint".to_string())
            })?;
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Azure embedding provider requires API key".to_string())
            })?;
            let provider = AzureEmbeddingProvider::new(
                endpoint,
                api_key,
                &config.llm.api_version,
                &settings.model,
                settings.dimensions,
                timeout,
            )?;
            Ok(Arc::new(provider))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: azure, ollama, mock",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(provider: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.embedding.provider = provider.to_string();
        config.embedding.dimensions = 384;
        config
    }

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider(&config_with("mock"), None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_ollama_provider() {
        let provider = create_provider(&config_with("ollama"), None).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
    }

    #[test]
    fn test_azure_falls_back_to_llm_endpoint() {
        let mut config = config_with("azure");
        config.llm.endpoint = Some("https://example.openai.azure.com".to_string());

        let provider = create_provider(&config, Some("key")).unwrap();
        assert_eq!(provider.provider_name(), "azure");
        assert_eq!(provider.model_name(), "text-embedding-ada-002");
    }

    #[test]
    fn test_azure_requires_key_and_endpoint() {
        let config = config_with("azure");
        assert!(create_provider(&config, Some("key")).is_err());

        let mut config = config_with("azure");
        config.llm.endpoint = Some("https://example.openai.azure.com".to_string());
        assert!(create_provider(&config, None).is_err());
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&config_with("unknown"), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }
}
