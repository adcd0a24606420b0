//! Wiring of providers and pipeline components from configuration.
//!
//! Every provider client is constructed once here and shared by the
//! components that need it.

use crate::chunker::RecursiveChunker;
use crate::embeddings::{self, Embedder};
use crate::ingest::Ingestor;
use crate::rag::{AnswerOrchestrator, Simplifier};
use crate::retrieval::Retriever;
use crate::search::{self, IndexClient};
use crate::session::{Mode, Session, UploadPolicy};
use easydocs_core::{AppConfig, AppResult};
use easydocs_llm::{create_client, LlmClient};
use easydocs_prompt::{load_prompt, GROUNDED_QA_PROMPT, SIMPLIFY_PROMPT};
use std::sync::Arc;

/// Fully wired document QA pipeline.
#[derive(Clone)]
pub struct Pipeline {
    pub llm: Arc<dyn LlmClient>,
    pub index: Arc<IndexClient>,
    pub ingestor: Arc<Ingestor>,
    pub retriever: Retriever,
    pub orchestrator: AnswerOrchestrator,
    pub simplifier: Simplifier,
    pub policy: UploadPolicy,
}

fn optional_secret(env_var: &str) -> Option<String> {
    AppConfig::resolve_secret(env_var).ok()
}

impl Pipeline {
    /// Validate `config` and build every component it describes.
    ///
    /// Prompts come from the workspace when overridden there.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let llm_key = optional_secret(&config.llm.api_key_env);
        let search_key = optional_secret(&config.search.api_key_env);

        let llm = create_client(&config.llm, llm_key.as_deref())?;
        let provider = embeddings::create_provider(config, llm_key.as_deref())?;
        let backend = search::create_index(config, search_key.as_deref())?;

        tracing::debug!(
            "Pipeline providers: completion={}, embedding={}, index={}",
            llm.provider_name(),
            provider.provider_name(),
            backend.name()
        );

        let embedder = Arc::new(Embedder::new(provider, config.embedding.batch_size));
        let index = Arc::new(IndexClient::new(backend));
        let chunker = RecursiveChunker::from_settings(&config.chunking)?;

        let qa_prompt = load_prompt(&config.workspace, GROUNDED_QA_PROMPT)?;
        let simplify_prompt = load_prompt(&config.workspace, SIMPLIFY_PROMPT)?;

        Ok(Self {
            llm: llm.clone(),
            index: index.clone(),
            ingestor: Arc::new(Ingestor::new(chunker, embedder.clone(), index.clone())),
            retriever: Retriever::new(embedder, index).with_top_k(config.search.top_k),
            orchestrator: AnswerOrchestrator::new(llm.clone(), &config.llm.model, qa_prompt),
            simplifier: Simplifier::new(llm, &config.llm.model, simplify_prompt),
            policy: UploadPolicy::from_settings(&config.upload),
        })
    }

    /// A new chat session sharing this pipeline's components.
    pub fn session(&self, mode: Mode) -> Session {
        Session::new(
            self.ingestor.clone(),
            self.retriever.clone(),
            self.orchestrator.clone(),
            self.simplifier.clone(),
            self.policy.clone(),
        )
        .with_mode(mode)
    }
}
