//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use easydocs_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// This function:
/// 1. Checks that every variable declared in `input.variables` is present
/// 2. Renders the system and user templates with Handlebars
/// 3. Returns a `BuiltPrompt` ready for LLM execution
///
/// # Example
/// ```no_run
/// use easydocs_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("text".to_string(), "The Lessee shall indemnify...".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let missing: Vec<&str> = definition
        .input
        .variables
        .iter()
        .filter(|name| !variables.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' is missing variables: {}",
            definition.id,
            missing.join(", ")
        )));
    }

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system,
        user,
        prompt_id: definition.id.clone(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptInputSpec, PromptOutputSpec};

    fn create_test_definition() -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            input: PromptInputSpec {
                variables: vec!["question".to_string()],
            },
            system: Some("Reply with \"{{fallback}}\" when unsure.".to_string()),
            template: "Question: {{question}}".to_string(),
            output: PromptOutputSpec {
                format: "text".to_string(),
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("prompt".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{prompt}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape_html() {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "A & B <c>".to_string());

        let result = render_template("{{text}}", &vars).unwrap();
        assert_eq!(result, "A & B <c>");
    }

    #[test]
    fn test_build_prompt_renders_system_and_user() {
        let def = create_test_definition();
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Who signs?".to_string());
        vars.insert("fallback".to_string(), "Not found.".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user, "Question: Who signs?");
        assert_eq!(
            built.system.as_deref(),
            Some("Reply with \"Not found.\" when unsure.")
        );
        assert_eq!(built.prompt_id, "test.prompt");
    }

    #[test]
    fn test_build_prompt_missing_declared_variable() {
        let def = create_test_definition();
        let result = build_prompt(&def, HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(msg)) if msg.contains("question")));
    }
}
