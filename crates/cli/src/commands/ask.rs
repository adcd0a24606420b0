//! Ask command handler.
//!
//! Retrieves the best matching chunks for a question and has the completion
//! model answer from them alone.

use clap::Args;
use easydocs_core::{config::AppConfig, AppError, AppResult};
use easydocs_knowledge::Pipeline;
use std::io::Read;

/// Ask a question about uploaded documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask (read from stdin when omitted)
    pub question: Option<String>,

    /// Number of chunks to retrieve (default: search.top_k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Print the retrieved context below the answer
    #[arg(long)]
    pub show_context: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question()?;
        let pipeline = Pipeline::from_config(config)?;

        let retriever = match self.top_k {
            Some(k) => pipeline.retriever.clone().with_top_k(k),
            None => pipeline.retriever.clone(),
        };

        let context = retriever.retrieve(&question).await?;
        tracing::debug!("Retrieved {} chunks", context.len());

        let answer = pipeline.orchestrator.answer(&question, &context).await?;

        if self.json {
            let output = serde_json::json!({
                "question": question,
                "answer": answer.text,
                "grounded": answer.grounded,
                "notFound": answer.is_not_found(),
                "contextChunks": answer.context_chunks,
                "promptId": answer.prompt_id,
                "context": context.chunks,
                "model": config.llm.model,
                "provider": pipeline.llm.provider_name(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{}", answer.text);

        if self.show_context && !context.is_empty() {
            println!();
            for (i, chunk) in context.chunks.iter().enumerate() {
                println!("--- context {} ---", i + 1);
                println!("{}", chunk);
            }
        }

        Ok(())
    }

    fn question(&self) -> AppResult<String> {
        let question = match &self.question {
            Some(q) => q.clone(),
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            }
        };

        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("No question provided".to_string()));
        }
        Ok(question.to_string())
    }
}
