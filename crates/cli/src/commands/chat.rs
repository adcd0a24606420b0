//! Chat command handler.
//!
//! Runs a [`Session`](easydocs_knowledge::Session) over the terminal. Each
//! stdin line is one event; `/file <path>` uploads a file directly and
//! `/upload` prompts for a path. With `--events`, every line is a JSON
//! event instead (`{"type":"text","text":"..."}` or
//! `{"type":"file","name":"...","bytes":[...],"mime_type":"..."}`) and
//! replies are written as JSON lines.

use clap::Args;
use easydocs_core::{config::AppConfig, AppResult};
use easydocs_knowledge::session::{MODE_COMMAND, UPLOAD_COMMAND};
use easydocs_knowledge::{FileUpload, InboundEvent, Mode, Pipeline, SessionSurface};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

const FILE_COMMAND: &str = "/file";
const QUIT_COMMAND: &str = "/quit";

/// Interactive chat session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Initial mode (ask, simplify)
    #[arg(short, long, default_value = "ask", value_parser = parse_mode)]
    pub mode: Mode,

    /// Read JSON events from stdin and write JSON replies
    #[arg(long)]
    pub events: bool,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    Mode::parse(s).ok_or_else(|| format!("unknown mode '{}' (expected ask or simplify)", s))
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command in {} mode", self.mode);

        let pipeline = Pipeline::from_config(config)?;
        let mut session = pipeline.session(self.mode);
        let mut surface = TerminalSurface::new(self.events);

        if !self.events {
            surface
                .send(&format!(
                    "EasyDocs chat ({} mode). Commands: {}, {} <path>, {} ask|simplify, {}",
                    self.mode, UPLOAD_COMMAND, FILE_COMMAND, MODE_COMMAND, QUIT_COMMAND
                ))
                .await?;
        }

        session.run(&mut surface).await
    }
}

/// Line-oriented stdin/stdout surface.
struct TerminalSurface {
    lines: Lines<BufReader<Stdin>>,
    stdout: Stdout,
    events: bool,
}

impl TerminalSurface {
    fn new(events: bool) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            stdout: tokio::io::stdout(),
            events,
        }
    }

    async fn next_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                None
            }
        }
    }

    async fn write_line(&mut self, line: &str) -> AppResult<()> {
        self.stdout.write_all(line.as_bytes()).await?;
        self.stdout.write_all(b"\n").await?;
        self.stdout.flush().await?;
        Ok(())
    }

    async fn load_file(&mut self, path: &str) -> Option<FileUpload> {
        match FileUpload::from_path(Path::new(path.trim())).await {
            Ok(upload) => Some(upload),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.trim(), e);
                eprintln!("Could not read '{}'.", path.trim());
                None
            }
        }
    }

    async fn parse_line(&mut self, line: &str) -> Option<InboundEvent> {
        if self.events {
            return match InboundEvent::decode(line) {
                Ok(event) => Some(event),
                Err(e) => {
                    eprintln!("{}", e);
                    None
                }
            };
        }

        match line.strip_prefix(FILE_COMMAND) {
            Some(path) if path.starts_with(' ') => self.load_file(path).await.map(InboundEvent::File),
            _ => Some(InboundEvent::text(line)),
        }
    }
}

#[async_trait::async_trait]
impl SessionSurface for TerminalSurface {
    async fn recv(&mut self) -> Option<InboundEvent> {
        loop {
            let line = self.next_line().await?;
            if line.trim().is_empty() {
                continue;
            }
            if !self.events && line.trim() == QUIT_COMMAND {
                return None;
            }
            if let Some(event) = self.parse_line(&line).await {
                return Some(event);
            }
        }
    }

    async fn send(&mut self, text: &str) -> AppResult<()> {
        if self.events {
            let reply = serde_json::to_string(&InboundEvent::text(text))?;
            return self.write_line(&reply).await;
        }
        self.write_line(text).await
    }

    async fn request_file(&mut self, prompt: &str) -> Option<FileUpload> {
        if self.events {
            return match self.next_line().await.map(|l| InboundEvent::decode(&l)) {
                Some(Ok(InboundEvent::File(upload))) => Some(upload),
                _ => None,
            };
        }

        if let Err(e) = self.write_line(&format!("{} Enter a file path:", prompt)).await {
            tracing::warn!("Failed to write prompt: {}", e);
        }
        let line = self.next_line().await?;
        if line.trim().is_empty() {
            return None;
        }
        self.load_file(&line).await
    }
}
