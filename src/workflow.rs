//! Send-message workflow
//!
//! One user turn is a small state machine: record the user's message,
//! screen it through preprocess, then optionally generate a reply. The
//! transition function is pure; the runtime executes the effects it emits.

mod effect;
pub mod event;
mod guard;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::TurnEvent;
pub use guard::{InFlightRegistry, Reservation};
pub use state::{TurnContext, TurnOutcome, TurnState};
pub use transition::{preprocess_error_message, transition, TransitionError};
