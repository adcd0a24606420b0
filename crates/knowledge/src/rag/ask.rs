//! Grounded answer generation.
//!
//! Turns a question and its retrieved context into a single completion
//! request. The system message restricts the model to the supplied context
//! and names the exact sentence to reply with when the context does not
//! contain the answer. An empty context short-circuits to that sentence
//! without contacting the model.

use crate::rag::types::{Answer, NOT_FOUND_ANSWER};
use crate::types::RetrievedContext;
use easydocs_core::AppResult;
use easydocs_llm::{LlmClient, LlmRequest};
use easydocs_prompt::{build_prompt, builtin_prompt, PromptDefinition, GROUNDED_QA_PROMPT};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds grounded completion requests and returns the model's reply.
#[derive(Clone)]
pub struct AnswerOrchestrator {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl AnswerOrchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt,
        }
    }

    /// Orchestrator using the built-in grounded QA prompt.
    pub fn with_builtin_prompt(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> AppResult<Self> {
        Ok(Self::new(llm, model, builtin_prompt(GROUNDED_QA_PROMPT)?))
    }

    /// Answer `question` from `context`.
    ///
    /// The model's reply is returned verbatim. Provider failures propagate
    /// as errors.
    pub async fn answer(&self, question: &str, context: &RetrievedContext) -> AppResult<Answer> {
        if context.is_empty() {
            tracing::info!("No context retrieved; returning not-found answer");
            return Ok(Answer::not_found());
        }

        let request = self.build_request(question, context)?;

        tracing::info!(
            "Generating answer with {} (prompt: {}, context chunks: {})",
            self.llm.provider_name(),
            self.prompt.id,
            context.len()
        );

        let response = self.llm.complete(&request).await?;

        tracing::debug!(
            "Answer generated ({} prompt tokens, {} completion tokens)",
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );

        Ok(Answer::grounded(response.content, context.len()).with_prompt_id(&self.prompt.id))
    }

    /// Build the completion request for a non-empty context.
    pub fn build_request(&self, question: &str, context: &RetrievedContext) -> AppResult<LlmRequest> {
        let variables = HashMap::from([
            ("question".to_string(), question.to_string()),
            ("context".to_string(), context.joined()),
            ("notFound".to_string(), NOT_FOUND_ANSWER.to_string()),
        ]);

        let built = build_prompt(&self.prompt, variables)?;
        tracing::debug!("Built prompt '{}' ({} chars)", built.prompt_id, built.user.len());

        let mut request = LlmRequest::new(&self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        Ok(request.with_user(built.user).with_temperature(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::FakeLlm;
    use easydocs_core::AppError;

    fn context(chunks: &[&str]) -> RetrievedContext {
        RetrievedContext::new(
            "Who pays for repairs?",
            chunks.iter().map(|c| c.to_string()).collect(),
        )
    }

    fn orchestrator(llm: Arc<FakeLlm>) -> AnswerOrchestrator {
        AnswerOrchestrator::with_builtin_prompt(llm, "gpt-4o").unwrap()
    }

    #[tokio::test]
    async fn test_empty_context_never_calls_model() {
        let llm = Arc::new(FakeLlm::replying("should not be used"));
        let answer = orchestrator(llm.clone())
            .answer("Who pays for repairs?", &context(&[]))
            .await
            .unwrap();

        assert_eq!(answer.text, NOT_FOUND_ANSWER);
        assert!(!answer.grounded);
        assert_eq!(answer.prompt_id, None);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_reply_is_returned_verbatim() {
        let llm = Arc::new(FakeLlm::replying("  The landlord pays.\n"));
        let answer = orchestrator(llm.clone())
            .answer("Who pays for repairs?", &context(&["The landlord pays for repairs."]))
            .await
            .unwrap();

        assert_eq!(answer.text, "  The landlord pays.\n");
        assert_eq!(answer.context_chunks, 1);
        assert_eq!(answer.prompt_id.as_deref(), Some(GROUNDED_QA_PROMPT));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_grounding_rules() {
        let llm = Arc::new(FakeLlm::replying("ok"));
        orchestrator(llm.clone())
            .answer(
                "Who pays for repairs?",
                &context(&["The landlord pays for repairs.", "Rent is due monthly."]),
            )
            .await
            .unwrap();

        let request = llm.last_request().unwrap();
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.model, "gpt-4o");

        let system = request.system().unwrap();
        assert!(system.contains(&format!("reply exactly: \"{}\"", NOT_FOUND_ANSWER)));
        assert!(system.contains("same language as the source document"));

        let user = request.last_user().unwrap();
        assert!(user.contains("The landlord pays for repairs.\n\nRent is due monthly."));
        assert!(user.contains("Question: Who pays for repairs?"));
    }

    #[tokio::test]
    async fn test_context_order_is_preserved() {
        let request = orchestrator(Arc::new(FakeLlm::replying("ok")))
            .build_request("q", &context(&["first", "second", "third"]))
            .unwrap();

        let user = request.last_user().unwrap();
        let first = user.find("first").unwrap();
        let second = user.find("second").unwrap();
        let third = user.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let llm = Arc::new(FakeLlm::failing());
        let result = orchestrator(llm)
            .answer("q", &context(&["something"]))
            .await;
        assert!(matches!(result, Err(AppError::Provider { .. })));
    }
}
