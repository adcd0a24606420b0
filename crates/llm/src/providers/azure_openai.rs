//! Azure OpenAI chat completion provider.
//!
//! Calls `POST {endpoint}/openai/deployments/{deployment}/chat/completions`
//! with the `api-key` header. The request's `model` is the deployment id.

use crate::client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use easydocs_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "azure-openai";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    /// Absent when the response was withheld by content filtering
    #[serde(default)]
    content: Option<String>,
}

/// Azure OpenAI completion client.
pub struct AzureOpenAiClient {
    endpoint: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl AzureOpenAiClient {
    /// Create a client for an Azure OpenAI resource.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::provider(PROVIDER, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            client,
        })
    }

    fn completions_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, deployment, self.api_version
        )
    }

    fn convert_response(&self, response: ChatCompletionResponse) -> AppResult<LlmResponse> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::provider(PROVIDER, "Response contained no message content"))?;

        Ok(LlmResponse {
            content,
            model: response.model,
            usage: response.usage.unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for AzureOpenAiClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(
            "Sending chat completion to Azure OpenAI (deployment: {}, messages: {})",
            request.model,
            request.messages.len()
        );

        let body = ChatCompletionRequest {
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url(&request.model))
            .header("api-key", &self.api_key)
            .json(&body)
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

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        let converted = self.convert_response(parsed)?;
        tracing::info!(
            "Received completion ({} total tokens)",
            converted.usage.total_tokens
        );

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AzureOpenAiClient {
        AzureOpenAiClient::new(
            "https://example.openai.azure.com/",
            "key",
            "2024-02-01",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            client().completions_url("gpt-4o"),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = LlmRequest::new("gpt-4o")
            .with_system("sys")
            .with_user("q")
            .with_temperature(0.0);
        let body = ChatCompletionRequest {
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "q");
        assert_eq!(json["temperature"], 0.0);
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_convert_response() {
        let raw = r#"{
            "model": "gpt-4o",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Section 12."}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 3, "total_tokens": 43}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();

        let response = client().convert_response(parsed).unwrap();
        assert_eq!(response.content, "Section 12.");
        assert_eq!(response.usage.total_tokens, 43);
    }

    #[test]
    fn test_convert_filtered_response_is_provider_error() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();

        let result = client().convert_response(parsed);
        assert!(matches!(result, Err(AppError::Provider { .. })));
    }
}
