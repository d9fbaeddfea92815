//! Effects produced by turn transitions

use super::TurnOutcome;
use crate::chat::Sender;
use std::time::Duration;

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the turn's conversation
    AppendMessage { sender: Sender, content: String },

    /// Cosmetic pause before the next effect
    Pause { delay: Duration },

    /// Call the preprocess endpoint
    Preprocess { prompt: String },

    /// Call the generate endpoint
    Generate { prompt: String },

    /// The turn is over
    Finish { outcome: TurnOutcome },
}

impl Effect {
    pub fn user_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::User,
            content: content.into(),
        }
    }

    pub fn assistant_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::Assistant,
            content: content.into(),
        }
    }

    /// `Pause` for a non-zero delay, nothing otherwise
    pub fn pause(delay: Duration) -> Option<Self> {
        (!delay.is_zero()).then_some(Effect::Pause { delay })
    }

    pub fn is_remote_call(&self) -> bool {
        matches!(self, Effect::Preprocess { .. } | Effect::Generate { .. })
    }
}
