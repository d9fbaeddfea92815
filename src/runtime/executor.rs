//! Turn executor
//!
//! Feeds events through the pure transition function and performs the
//! resulting effects against the conversation store and the assistant
//! back-end.

use crate::chat::{ChatEvent, ChatStore, Sender};
use crate::remote::{AssistantBackend, PreprocessVerdict};
use crate::workflow::{
    preprocess_error_message, transition, Effect, Reservation, TransitionError, TurnContext,
    TurnEvent, TurnOutcome, TurnState,
};
use std::sync::Arc;

/// A turn whose user message is recorded and which still owns its
/// conversation's in-flight reservation
#[must_use = "a pending turn does nothing until run"]
pub struct PendingTurn<B>
where
    B: AssistantBackend + 'static,
{
    context: TurnContext,
    state: TurnState,
    store: ChatStore,
    backend: Arc<B>,
    /// Released before `TurnFinished` is published
    reservation: Option<Reservation>,
}

impl<B> PendingTurn<B>
where
    B: AssistantBackend + 'static,
{
    /// Submit `text` and record the user message.
    ///
    /// Nothing is stored when the transition refuses the input.
    pub(super) fn begin(
        context: TurnContext,
        store: ChatStore,
        backend: Arc<B>,
        reservation: Reservation,
        text: &str,
    ) -> Result<Self, TransitionError> {
        let result = transition(
            &TurnState::Idle,
            &context,
            TurnEvent::Submit {
                text: text.to_string(),
            },
        )?;

        let turn = Self {
            context,
            state: result.new_state,
            store,
            backend,
            reservation: Some(reservation),
        };
        for effect in result.effects {
            turn.apply_local(&effect);
        }
        Ok(turn)
    }

    pub fn conversation_id(&self) -> &str {
        &self.context.conversation_id
    }

    /// Drive the turn to completion. The reservation is released before
    /// the finish is announced, whichever branch was taken.
    pub async fn run(mut self) -> TurnOutcome {
        let conv_id = self.context.conversation_id.clone();
        tracing::info!(conv_id = %conv_id, "Turn started");

        let mut events_to_process = vec![TurnEvent::Dispatch];

        while let Some(event) = events_to_process.pop() {
            let result = match transition(&self.state, &self.context, event) {
                Ok(r) => r,
                Err(e) => {
                    // Unreachable with a well-formed effect sequence; end the turn visibly
                    tracing::error!(conv_id = %conv_id, error = %e, "Turn transition failed");
                    self.append(Sender::Assistant, &preprocess_error_message(&e.to_string()));
                    self.state = TurnState::Done {
                        outcome: TurnOutcome::PreprocessFailed,
                    };
                    self.finish(TurnOutcome::PreprocessFailed);
                    break;
                }
            };

            self.state = result.new_state;

            for effect in result.effects {
                if let Effect::Finish { outcome } = effect {
                    self.finish(outcome);
                    continue;
                }
                if effect.is_remote_call() {
                    tracing::debug!(
                        conv_id = %conv_id,
                        effect = ?effect,
                        "Dispatching remote call"
                    );
                }
                if let Some(generated) = self.execute_effect(effect).await {
                    events_to_process.push(generated);
                }
            }

            if self.state.is_done() {
                break;
            }
        }

        let outcome = if let TurnState::Done { outcome } = self.state {
            outcome
        } else {
            tracing::error!(
                conv_id = %conv_id,
                state = ?self.state,
                "Turn stopped before completion"
            );
            self.finish(TurnOutcome::PreprocessFailed);
            TurnOutcome::PreprocessFailed
        };

        tracing::info!(conv_id = %conv_id, outcome = %outcome, "Turn finished");
        outcome
    }

    /// Release the conversation, then tell subscribers the turn is over.
    /// Only the first call has any effect.
    fn finish(&mut self, outcome: TurnOutcome) {
        let Some(reservation) = self.reservation.take() else {
            return;
        };
        drop(reservation);
        self.store.publish(ChatEvent::TurnFinished {
            conversation_id: self.context.conversation_id.clone(),
            outcome: outcome.as_str().to_string(),
        });
    }

    async fn execute_effect(&self, effect: Effect) -> Option<TurnEvent> {
        match effect {
            Effect::Pause { delay } => {
                tokio::time::sleep(delay).await;
                None
            }

            Effect::Preprocess { prompt } => {
                let verdict = match self.backend.preprocess(&prompt).await {
                    Ok(verdict) => verdict,
                    Err(e) => PreprocessVerdict::Error { detail: e.message },
                };
                Some(TurnEvent::PreprocessComplete { verdict })
            }

            Effect::Generate { prompt } => Some(match self.backend.generate(&prompt).await {
                Ok(response) => TurnEvent::GenerateComplete { response },
                Err(e) => TurnEvent::GenerateFailed { detail: e.message },
            }),

            local @ (Effect::AppendMessage { .. } | Effect::Finish { .. }) => {
                self.apply_local(&local);
                None
            }
        }
    }

    /// Effects that need no awaiting
    fn apply_local(&self, effect: &Effect) {
        match effect {
            Effect::AppendMessage { sender, content } => self.append(*sender, content),
            other => {
                tracing::warn!(effect = ?other, "Effect cannot be applied synchronously");
            }
        }
    }

    fn append(&self, sender: Sender, content: &str) {
        if let Err(e) = self
            .store
            .add_message_to(&self.context.conversation_id, content, sender)
        {
            tracing::error!(
                conv_id = %self.context.conversation_id,
                error = %e,
                "Failed to persist message"
            );
        }
    }
}
