//! Error types for EasyDocs.
//!
//! This module defines a unified error enum covering every failure category
//! of the document QA pipeline: configuration, I/O, external providers
//! (embedding, search, completion), partial embedding results, upload
//! validation, text extraction, prompts, and serialization.

use thiserror::Error;

/// Generic message shown to users when an external provider fails.
pub const PROVIDER_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while talking to an external service. Please try again later.";

/// Unified error type for EasyDocs.
///
/// All fallible functions return `Result<T, AppError>`.
/// Failures are values: handlers convert them into a chat message
/// instead of unwinding.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding, search, or completion provider failure (transport, HTTP, malformed output)
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// Provider returned fewer embeddings than inputs submitted
    #[error("Partial result: expected {expected} embeddings, received {received}")]
    PartialResult { expected: usize, received: usize },

    /// Rejected user input (no file, wrong type, too large, empty text)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document text extraction errors
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build a provider error.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Text sent back to the user when this error ends a request.
    ///
    /// Validation failures are explained; everything else collapses to a
    /// generic message so provider internals never reach the chat.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Extraction(_) => {
                "Sorry, I could not read any text from that document.".to_string()
            }
            AppError::Provider { .. } | AppError::PartialResult { .. } => {
                PROVIDER_FAILURE_MESSAGE.to_string()
            }
            _ => "Sorry, something went wrong while processing your request.".to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
