//! Answer types.

use serde::{Deserialize, Serialize};

/// Reply used when retrieval finds nothing, and the reply the model is
/// instructed to give when the context does not contain the answer.
pub const NOT_FOUND_ANSWER: &str =
    "I could not find relevant information in the uploaded documents.";

/// Answer to a user question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Reply text, exactly as returned by the model
    pub text: String,

    /// False when no context was retrieved and the model was not consulted
    pub grounded: bool,

    /// Number of context chunks supplied to the model
    pub context_chunks: usize,

    /// Prompt the model was called with; `None` when it was not called
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,
}

impl Answer {
    pub fn grounded(text: String, context_chunks: usize) -> Self {
        Self {
            text,
            grounded: true,
            context_chunks,
            prompt_id: None,
        }
    }

    /// Fixed reply for an empty retrieval.
    pub fn not_found() -> Self {
        Self {
            text: NOT_FOUND_ANSWER.to_string(),
            grounded: false,
            context_chunks: 0,
            prompt_id: None,
        }
    }

    pub fn with_prompt_id(mut self, prompt_id: impl Into<String>) -> Self {
        self.prompt_id = Some(prompt_id.into());
        self
    }

    /// True when the reply is the not-found sentence, whether it came from
    /// an empty retrieval or from the model.
    pub fn is_not_found(&self) -> bool {
        self.text.trim() == NOT_FOUND_ANSWER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_answer() {
        let answer = Answer::not_found();
        assert_eq!(answer.text, NOT_FOUND_ANSWER);
        assert!(!answer.grounded);
        assert!(answer.is_not_found());
    }

    #[test]
    fn test_model_refusal_is_detected() {
        let answer = Answer::grounded(format!("{}\n", NOT_FOUND_ANSWER), 3);
        assert!(answer.grounded);
        assert!(answer.is_not_found());
    }

    #[test]
    fn test_answer_serialization() {
        let json = serde_json::to_value(Answer::grounded("Yes.".to_string(), 2)).unwrap();
        assert_eq!(json["text"], "Yes.");
        assert_eq!(json["context_chunks"], 2);
        assert!(json.get("prompt_id").is_none());
    }
}
