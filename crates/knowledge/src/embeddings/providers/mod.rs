//! Embedding provider implementations.

pub mod azure;
pub mod mock;
pub mod ollama;

pub use azure::AzureEmbeddingProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
