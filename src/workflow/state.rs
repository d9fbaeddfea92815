//! Turn state types

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Where a single send-message turn currently stands
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnState {
    /// Nothing submitted yet
    #[default]
    Idle,

    /// User message appended, preprocess not yet dispatched
    UserMessageRecorded { prompt: String },

    /// Waiting on the preprocess call
    Preprocessing,

    /// Waiting on the generate call
    Generating { prompt: String },

    /// Terminal
    Done { outcome: TurnOutcome },
}

impl TurnState {
    pub fn is_done(&self) -> bool {
        matches!(self, TurnState::Done { .. })
    }
}

/// How a finished turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Preprocess refused the prompt
    Rejected,
    /// Preprocess passed but gave no prompt to generate from
    NoPrompt,
    /// A generated reply was appended
    Generated,
    /// Generate failed; an error message was appended
    GenerateFailed,
    /// Preprocess failed; an error message was appended
    PreprocessFailed,
}

impl TurnOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnOutcome::Rejected => "rejected",
            TurnOutcome::NoPrompt => "no_prompt",
            TurnOutcome::Generated => "generated",
            TurnOutcome::GenerateFailed => "generate_failed",
            TurnOutcome::PreprocessFailed => "preprocess_failed",
        }
    }
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed parameters of a turn
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub conversation_id: String,
    /// Pause before showing a reject/inform message
    pub display_delay: Duration,
    /// Pause between an inform message and the generate call
    pub generate_delay: Duration,
}

impl TurnContext {
    pub fn new(
        conversation_id: impl Into<String>,
        display_delay: Duration,
        generate_delay: Duration,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            display_delay,
            generate_delay,
        }
    }
}
