//! LLM provider factory.
//!
//! Builds the completion client once, at startup, from the `llm` section of
//! the application configuration. The result is injected wherever a
//! completion is needed.

use crate::client::LlmClient;
use crate::providers::{AzureOpenAiClient, OllamaClient, DEFAULT_OLLAMA_URL};
use crate::types::ProviderType;
use easydocs_core::config::LlmSettings;
use easydocs_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a completion client from settings.
///
/// # Arguments
/// * `settings` - The `llm` configuration section
/// * `api_key` - API key (required by Azure OpenAI)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// endpoint/key is missing.
pub fn create_client(settings: &LlmSettings, api_key: Option<&str>) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", settings.provider)))?;
    let timeout = Duration::from_secs(settings.timeout);

    match provider {
        ProviderType::Ollama => {
            let base_url = settings.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_timeout(base_url, timeout)?))
        }
        ProviderType::AzureOpenAI => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                AppError::Config("Azure OpenAI provider requires an endpoint".to_string())
            })?;
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Azure OpenAI provider requires API key".to_string())
            })?;
            let client =
                AzureOpenAiClient::new(endpoint, api_key, settings.api_version.clone(), timeout)?;
            Ok(Arc::new(client))
        }
    }
}
