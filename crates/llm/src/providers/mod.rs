//! Completion provider implementations.

mod azure_openai;
mod ollama;

pub use azure_openai::AzureOpenAiClient;
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
