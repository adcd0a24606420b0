//! Index command handler.

use clap::{Args, Subcommand};
use easydocs_core::{config::AppConfig, AppResult};
use easydocs_knowledge::Pipeline;

/// Search index management
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Create the search index if it does not exist yet
    Init,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match self.action {
            IndexAction::Init => {
                tracing::info!("Executing index init for '{}'", config.search.index_name);

                let pipeline = Pipeline::from_config(config)?;
                let backend = pipeline.index.backend();

                if backend.ensure_index().await? {
                    println!(
                        "Created index '{}' on {}",
                        config.search.index_name,
                        backend.name()
                    );
                } else {
                    println!(
                        "Index '{}' already exists on {}",
                        config.search.index_name,
                        backend.name()
                    );
                }
                Ok(())
            }
        }
    }
}
