//! Chat session dispatcher.
//!
//! A [`Session`] reads events from a [`SessionSurface`], routes each one
//! through the upload or question pipeline, and sends exactly one reply per
//! event. Failures become reply text via [`AppError::user_message`]; the
//! loop only ends when the surface has no more events.

pub mod events;
pub mod policy;
pub mod state;

pub use events::{detect_mime, FileUpload, InboundEvent};
pub use policy::UploadPolicy;
pub use state::{Turn, TurnState};

use crate::ingest::DocumentIngest;
use crate::rag::{Answer, AnswerOrchestrator, Simplifier};
use crate::retrieval::Retriever;
use crate::types::IngestReport;
use easydocs_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Text command that asks the surface for a file.
pub const UPLOAD_COMMAND: &str = "/upload";

/// Text command prefix that switches between ask and simplify mode.
pub const MODE_COMMAND: &str = "/mode";

pub const UPLOAD_PROMPT: &str = "Please upload a PDF document to begin.";

/// Bidirectional message channel to the user.
#[async_trait::async_trait]
pub trait SessionSurface: Send {
    /// Next inbound event, or `None` when the user is gone.
    async fn recv(&mut self) -> Option<InboundEvent>;

    async fn send(&mut self, text: &str) -> AppResult<()>;

    /// Ask the user for a file; `None` when nothing was provided.
    async fn request_file(&mut self, prompt: &str) -> Option<FileUpload>;
}

/// How plain text messages are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Answer questions from uploaded documents
    #[default]
    Ask,
    /// Rewrite pasted text in plain language
    Simplify,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Some(Mode::Ask),
            "simplify" => Some(Mode::Simplify),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Ask => "ask",
            Mode::Simplify => "simplify",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's conversation with the pipeline.
pub struct Session {
    ingest: Arc<dyn DocumentIngest>,
    retriever: Retriever,
    orchestrator: AnswerOrchestrator,
    simplifier: Simplifier,
    policy: UploadPolicy,
    mode: Mode,
    last_turn: Turn,
}

impl Session {
    pub fn new(
        ingest: Arc<dyn DocumentIngest>,
        retriever: Retriever,
        orchestrator: AnswerOrchestrator,
        simplifier: Simplifier,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            ingest,
            retriever,
            orchestrator,
            simplifier,
            policy,
            mode: Mode::default(),
            last_turn: Turn::new(),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// States visited by the most recently handled event.
    pub fn last_turn(&self) -> &Turn {
        &self.last_turn
    }

    /// Process events until the surface closes.
    pub async fn run<S>(&mut self, surface: &mut S) -> AppResult<()>
    where
        S: SessionSurface + ?Sized,
    {
        tracing::info!("Session started in {} mode", self.mode);

        while let Some(event) = surface.recv().await {
            let reply = self.handle(event, surface).await;
            if let Err(e) = surface.send(&reply).await {
                tracing::warn!("Failed to deliver reply: {}", e);
            }
        }

        tracing::info!("Session ended");
        Ok(())
    }

    /// Handle one event and return the reply text. Never fails.
    pub async fn handle<S>(&mut self, event: InboundEvent, surface: &mut S) -> String
    where
        S: SessionSurface + ?Sized,
    {
        let mut turn = Turn::new();

        let result = match event {
            InboundEvent::File(upload) => self.file_turn(upload, &mut turn).await,
            InboundEvent::Text { text } => {
                let text = text.trim();
                if text == UPLOAD_COMMAND {
                    self.upload_request_turn(surface, &mut turn).await
                } else if let Some(arg) = text.strip_prefix(MODE_COMMAND) {
                    self.mode_turn(arg, &mut turn)
                } else {
                    match self.mode {
                        Mode::Ask => self.question_turn(text, &mut turn).await,
                        Mode::Simplify => self.simplify_turn(text, &mut turn).await,
                    }
                }
            }
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Turn failed in state {}: {}", turn.state(), e);
                turn.fail();
                e.user_message()
            }
        };

        tracing::debug!("Turn finished: {:?}", turn.history());
        self.last_turn = turn;
        reply
    }

    /// Validate and ingest an upload.
    pub async fn upload(&self, upload: FileUpload) -> AppResult<IngestReport> {
        self.policy.check(&upload)?;
        self.ingest.ingest(&upload.into_document()).await
    }

    /// Retrieve context for `question` and answer it.
    pub async fn ask(&self, question: &str) -> AppResult<Answer> {
        let question = non_empty_question(question)?;
        let context = self.retriever.retrieve(question).await?;
        self.orchestrator.answer(question, &context).await
    }

    pub async fn simplify(&self, text: &str) -> AppResult<String> {
        self.simplifier.simplify(text).await
    }

    async fn upload_request_turn<S>(&self, surface: &mut S, turn: &mut Turn) -> AppResult<String>
    where
        S: SessionSurface + ?Sized,
    {
        turn.advance(TurnState::UploadRequested)?;
        let upload = surface
            .request_file(UPLOAD_PROMPT)
            .await
            .ok_or_else(|| AppError::Validation("No file was uploaded.".to_string()))?;

        turn.advance(TurnState::AwaitingFile)?;
        self.process_upload(upload, turn).await
    }

    async fn file_turn(&self, upload: FileUpload, turn: &mut Turn) -> AppResult<String> {
        turn.advance(TurnState::UploadRequested)?;
        turn.advance(TurnState::AwaitingFile)?;
        self.process_upload(upload, turn).await
    }

    async fn process_upload(&self, upload: FileUpload, turn: &mut Turn) -> AppResult<String> {
        self.policy.check(&upload)?;
        turn.advance(TurnState::Processing)?;

        let report = self.ingest.ingest(&upload.into_document()).await?;
        if report.written.is_empty() {
            return Err(AppError::PartialResult {
                expected: report.chunks,
                received: 0,
            });
        }

        turn.advance(TurnState::Done)?;
        Ok(upload_summary(&report))
    }

    async fn question_turn(&self, text: &str, turn: &mut Turn) -> AppResult<String> {
        turn.advance(TurnState::QueryReceived)?;
        let question = non_empty_question(text)?;

        turn.advance(TurnState::Retrieving)?;
        let context = self.retriever.retrieve(question).await?;

        turn.advance(TurnState::Answering)?;
        let answer = self.orchestrator.answer(question, &context).await?;

        turn.advance(TurnState::Done)?;
        Ok(answer.text)
    }

    async fn simplify_turn(&self, text: &str, turn: &mut Turn) -> AppResult<String> {
        turn.advance(TurnState::QueryReceived)?;
        turn.advance(TurnState::Answering)?;
        let reply = self.simplifier.simplify(text).await?;
        turn.advance(TurnState::Done)?;
        Ok(reply)
    }

    fn mode_turn(&mut self, arg: &str, turn: &mut Turn) -> AppResult<String> {
        let mode = Mode::parse(arg).ok_or_else(|| {
            AppError::Validation(format!(
                "Unknown mode '{}'. Use {} ask or {} simplify.",
                arg.trim(),
                MODE_COMMAND,
                MODE_COMMAND
            ))
        })?;

        self.mode = mode;
        turn.advance(TurnState::Done)?;
        tracing::info!("Session mode set to {}", mode);

        Ok(match mode {
            Mode::Ask => "Ask mode: send a question about your uploaded documents.".to_string(),
            Mode::Simplify => {
                "Simplify mode: send any text and I will rewrite it in plain language.".to_string()
            }
        })
    }
}

fn non_empty_question(text: &str) -> AppResult<&str> {
    let question = text.trim();
    if question.is_empty() {
        return Err(AppError::Validation(
            "Please type a question about your document.".to_string(),
        ));
    }
    Ok(question)
}

/// Chat reply describing a finished upload.
pub fn upload_summary(report: &IngestReport) -> String {
    let mut reply = format!(
        "Processed '{}': {} of {} sections indexed. You can now ask questions about it.",
        report.title,
        report.written.len(),
        report.chunks
    );

    let missing = report.skipped.len() + report.failed.len();
    if missing > 0 {
        reply.push_str(&format!(
            " Note: {} sections could not be indexed and will not be searched.",
            missing
        ));
    }

    reply
}
