//! Chat runtime
//!
//! Owns the stores, the assistant back-end and the in-flight registry, and
//! starts send-message turns against the active conversation.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::PendingTurn;

use crate::chat::ChatStore;
use crate::remote::{AssistantBackend, LoggingBackend};
use crate::settings::SettingsStore;
use crate::workflow::{InFlightRegistry, TransitionError, TurnContext, TurnOutcome};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Type alias for the production service with the logging HTTP back-end
pub type ProductionService = ChatService<LoggingBackend>;

/// Why a send request was dropped without doing anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Text was empty or whitespace only
    EmptyInput,
    /// A turn is already running for this conversation
    TurnInProgress,
    /// There is no conversation to send to
    NoActiveConversation,
}

impl IgnoreReason {
    pub fn as_str(self) -> &'static str {
        match self {
            IgnoreReason::EmptyInput => "empty_input",
            IgnoreReason::TurnInProgress => "turn_in_progress",
            IgnoreReason::NoActiveConversation => "no_active_conversation",
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a complete send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Ignored(IgnoreReason),
    Completed(TurnOutcome),
}

/// Entry point for everything the presentation layer can ask for
pub struct ChatService<B>
where
    B: AssistantBackend + 'static,
{
    store: ChatStore,
    settings: SettingsStore,
    backend: Arc<B>,
    in_flight: InFlightRegistry,
    display_delay: Duration,
    generate_delay: Duration,
}

impl<B> ChatService<B>
where
    B: AssistantBackend + 'static,
{
    pub fn new(store: ChatStore, settings: SettingsStore, backend: B) -> Self {
        Self {
            store,
            settings,
            backend: Arc::new(backend),
            in_flight: InFlightRegistry::new(),
            display_delay: Duration::ZERO,
            generate_delay: Duration::ZERO,
        }
    }

    /// Set the cosmetic pauses used by every turn
    pub fn with_delays(mut self, display_delay: Duration, generate_delay: Duration) -> Self {
        self.display_delay = display_delay;
        self.generate_delay = generate_delay;
        self
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Whether a turn is running for `conversation_id`
    pub fn is_busy(&self, conversation_id: &str) -> bool {
        self.in_flight.is_busy(conversation_id)
    }

    /// Validate `text`, claim the active conversation and record the
    /// user message. The returned turn must be run to get a reply.
    pub fn begin_turn(&self, text: &str) -> Result<PendingTurn<B>, IgnoreReason> {
        if text.trim().is_empty() {
            return Err(IgnoreReason::EmptyInput);
        }

        let conversation_id = match self.store.active_conversation_id() {
            Ok(Some(id)) => id,
            Ok(None) => return Err(IgnoreReason::NoActiveConversation),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read active conversation");
                return Err(IgnoreReason::NoActiveConversation);
            }
        };

        let Some(reservation) = self.in_flight.try_reserve(&conversation_id) else {
            tracing::debug!(conv_id = %conversation_id, "Ignoring send while turn in flight");
            return Err(IgnoreReason::TurnInProgress);
        };

        let context = TurnContext::new(conversation_id, self.display_delay, self.generate_delay);
        PendingTurn::begin(
            context,
            self.store.clone(),
            Arc::clone(&self.backend),
            reservation,
            text,
        )
        .map_err(|e| match e {
            TransitionError::EmptyInput => IgnoreReason::EmptyInput,
            TransitionError::TurnInProgress | TransitionError::InvalidTransition(_) => {
                IgnoreReason::TurnInProgress
            }
        })
    }

    /// Run a whole turn for `text` and wait for it to finish
    #[allow(dead_code)] // The API spawns the turn instead of awaiting it
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        match self.begin_turn(text) {
            Ok(turn) => SendOutcome::Completed(turn.run().await),
            Err(reason) => SendOutcome::Ignored(reason),
        }
    }
}
