//! EasyDocs CLI
//!
//! Upload PDFs, ask grounded questions about them, simplify text, or open
//! an interactive chat session in the terminal.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, IndexCommand, SimplifyCommand, UploadCommand};
use easydocs_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// EasyDocs - question answering over your own PDF documents
#[derive(Parser, Debug)]
#[command(name = "easydocs")]
#[command(about = "Question answering over uploaded PDF documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "EASYDOCS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.easydocs/config.yaml)
    #[arg(short, long, global = true, env = "EASYDOCS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a PDF into the search index
    Upload(UploadCommand),

    /// Ask a question about uploaded documents
    Ask(AskCommand),

    /// Rewrite text in plain language
    Simplify(SimplifyCommand),

    /// Interactive chat session
    Chat(ChatCommand),

    /// Search index management
    Index(IndexCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Workspace and config file must be known before the YAML merge
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("EasyDocs CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Providers: llm={}, embedding={}, search={}",
        config.llm.provider,
        config.embedding.provider,
        config.search.provider
    );

    let command_name = match &cli.command {
        Commands::Upload(_) => "upload",
        Commands::Ask(_) => "ask",
        Commands::Simplify(_) => "simplify",
        Commands::Chat(_) => "chat",
        Commands::Index(_) => "index",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Upload(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Simplify(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
