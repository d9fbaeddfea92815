//! Pure turn transition function

use super::{Effect, TurnContext, TurnEvent, TurnOutcome, TurnState};
use crate::remote::PreprocessVerdict;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    fn done(outcome: TurnOutcome) -> Self {
        Self::new(TurnState::Done { outcome })
    }

    fn finish(self) -> Self {
        let TurnState::Done { outcome } = self.new_state else {
            return self;
        };
        self.with_effect(Effect::Finish { outcome })
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("A message is already being processed for this conversation")]
    TurnInProgress,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn preprocess_error_message(detail: &str) -> String {
    format!("Sorry, I couldn't process your message: {detail}")
}

pub fn generate_error_message(detail: &str) -> String {
    format!("Sorry, I couldn't generate a response: {detail}")
}

/// Pure transition function.
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
pub fn transition(
    state: &TurnState,
    context: &TurnContext,
    event: TurnEvent,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Idle + Submit -> UserMessageRecorded
        (TurnState::Idle, TurnEvent::Submit { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            Ok(
                TransitionResult::new(TurnState::UserMessageRecorded {
                    prompt: text.clone(),
                })
                .with_effect(Effect::user_message(text)),
            )
        }

        (_, TurnEvent::Submit { .. }) => Err(TransitionError::TurnInProgress),

        // UserMessageRecorded + Dispatch -> Preprocessing
        (TurnState::UserMessageRecorded { prompt }, TurnEvent::Dispatch) => {
            Ok(TransitionResult::new(TurnState::Preprocessing).with_effect(Effect::Preprocess {
                prompt: prompt.clone(),
            }))
        }

        (TurnState::Preprocessing, TurnEvent::PreprocessComplete { verdict }) => {
            Ok(handle_verdict(context, verdict))
        }

        (TurnState::Generating { .. }, TurnEvent::GenerateComplete { response }) => {
            Ok(TransitionResult::done(TurnOutcome::Generated)
                .with_effect(Effect::assistant_message(response))
                .finish())
        }

        (TurnState::Generating { .. }, TurnEvent::GenerateFailed { detail }) => {
            Ok(TransitionResult::done(TurnOutcome::GenerateFailed)
                .with_effect(Effect::assistant_message(generate_error_message(&detail)))
                .finish())
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {state:?}"
        ))),
    }
}

/// Preprocessing + verdict -> Generating or Done
fn handle_verdict(context: &TurnContext, verdict: PreprocessVerdict) -> TransitionResult {
    match verdict {
        PreprocessVerdict::Reject { message } => TransitionResult::done(TurnOutcome::Rejected)
            .with_effects(display(context, message))
            .finish(),

        PreprocessVerdict::InformAndPass {
            message,
            original_prompt,
        } => {
            let shown = display(context, message);
            match original_prompt {
                Some(prompt) => TransitionResult::new(TurnState::Generating {
                    prompt: prompt.clone(),
                })
                .with_effects(shown)
                .with_effects(Effect::pause(context.generate_delay))
                .with_effect(Effect::Generate { prompt }),
                None => TransitionResult::done(TurnOutcome::NoPrompt)
                    .with_effects(shown)
                    .finish(),
            }
        }

        PreprocessVerdict::Pass { original_prompt } => match original_prompt {
            Some(prompt) => TransitionResult::new(TurnState::Generating {
                prompt: prompt.clone(),
            })
            .with_effect(Effect::Generate { prompt }),
            None => TransitionResult::done(TurnOutcome::NoPrompt).finish(),
        },

        PreprocessVerdict::Error { detail } => {
            TransitionResult::done(TurnOutcome::PreprocessFailed)
                .with_effect(Effect::assistant_message(preprocess_error_message(&detail)))
                .finish()
        }
    }
}

/// Delay-then-append for an optional assistant note
fn display(context: &TurnContext, message: Option<String>) -> Vec<Effect> {
    message
        .map(|text| {
            Effect::pause(context.display_delay)
                .into_iter()
                .chain(std::iter::once(Effect::assistant_message(text)))
                .collect()
        })
        .unwrap_or_default()
}
