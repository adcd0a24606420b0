//! Direct simplification of pasted text, without retrieval.

use easydocs_core::{AppError, AppResult};
use easydocs_llm::{LlmClient, LlmRequest};
use easydocs_prompt::{build_prompt, builtin_prompt, PromptDefinition, SIMPLIFY_PROMPT};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct Simplifier {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl Simplifier {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt,
        }
    }

    pub fn with_builtin_prompt(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> AppResult<Self> {
        Ok(Self::new(llm, model, builtin_prompt(SIMPLIFY_PROMPT)?))
    }

    /// Rewrite `text` in plain language.
    pub async fn simplify(&self, text: &str) -> AppResult<String> {
        if text.trim().is_empty() {
            return Err(AppError::Validation(
                "Please send the text you would like simplified.".to_string(),
            ));
        }

        let built = build_prompt(
            &self.prompt,
            HashMap::from([("text".to_string(), text.to_string())]),
        )?;

        let mut request = LlmRequest::new(&self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        let request = request.with_user(built.user).with_temperature(0.0);

        tracing::info!(
            "Simplifying {} characters of text (prompt: {})",
            text.chars().count(),
            built.prompt_id
        );
        let response = self.llm.complete(&request).await?;
        Ok(response.content)
    }
}
