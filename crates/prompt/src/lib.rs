//! Prompt system for EasyDocs.
//!
//! This crate provides structured prompt management with:
//! - Built-in YAML prompt definitions (grounded QA, simplification)
//! - Workspace overrides in `.easydocs/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, GROUNDED_QA_PROMPT, SIMPLIFY_PROMPT};
pub use types::{
    BuiltPrompt, PromptDefinition, PromptInputSpec, PromptOutputSpec,
};
