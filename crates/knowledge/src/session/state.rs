//! Per-turn state machine.
//!
//! Upload turns move `Idle → UploadRequested → AwaitingFile → Processing`,
//! question turns move `Idle → QueryReceived → Retrieving → Answering`
//! (simplification skips `Retrieving`). Every turn ends in `Done` or
//! `Failed`; any non-terminal state may fail.

use easydocs_core::{AppError, AppResult};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnState {
    Idle,
    UploadRequested,
    AwaitingFile,
    Processing,
    QueryReceived,
    Retrieving,
    Answering,
    Done,
    Failed,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnState::Done | TurnState::Failed)
    }

    fn can_move_to(self, next: TurnState) -> bool {
        use TurnState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, UploadRequested)
                | (UploadRequested, AwaitingFile)
                | (AwaitingFile, Processing)
                | (Processing, Done)
                | (Idle, QueryReceived)
                | (QueryReceived, Retrieving)
                | (QueryReceived, Answering)
                | (Retrieving, Answering)
                | (Answering, Done)
                | (Idle, Done)
        )
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks the states a single turn has passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    history: Vec<TurnState>,
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

impl Turn {
    pub fn new() -> Self {
        Self {
            history: vec![TurnState::Idle],
        }
    }

    pub fn state(&self) -> TurnState {
        self.history.last().copied().unwrap_or(TurnState::Idle)
    }

    pub fn history(&self) -> &[TurnState] {
        &self.history
    }

    /// Move to `next`, rejecting transitions the machine does not allow.
    pub fn advance(&mut self, next: TurnState) -> AppResult<()> {
        let current = self.state();
        if !current.can_move_to(next) {
            return Err(AppError::Other(format!(
                "Invalid turn transition: {} -> {}",
                current, next
            )));
        }

        tracing::trace!("Turn state {} -> {}", current, next);
        self.history.push(next);
        Ok(())
    }

    /// Mark the turn failed unless it already ended.
    pub fn fail(&mut self) {
        if !self.state().is_terminal() {
            self.history.push(TurnState::Failed);
        }
    }
}
