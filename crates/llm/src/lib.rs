//! Completion provider crate for EasyDocs.
//!
//! This crate provides a provider-agnostic abstraction for chat completions.
//! Clients are built once from configuration and shared as `Arc<dyn LlmClient>`,
//! so tests can substitute fakes.
//!
//! # Providers
//! - **Azure OpenAI**: chat completions on an Azure deployment (default)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use easydocs_llm::{LlmClient, LlmRequest, OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("llama3.2")
//!     .with_user("Hello, world!")
//!     .with_temperature(0.0);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage, Role};
pub use factory::create_client;
pub use providers::{AzureOpenAiClient, OllamaClient};
pub use types::ProviderType;
