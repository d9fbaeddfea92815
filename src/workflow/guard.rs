//! Per-conversation in-flight guard
//!
//! At most one turn may run per conversation. A turn holds a
//! [`Reservation`] for its whole lifetime; dropping it releases the
//! conversation, so release happens exactly once on every path.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Default)]
pub struct InFlightRegistry {
    busy: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set is never left half-updated, so a poisoned lock is still valid
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `conversation_id`, or `None` if a turn already holds it
    pub fn try_reserve(&self, conversation_id: &str) -> Option<Reservation> {
        if !self.lock().insert(conversation_id.to_string()) {
            return None;
        }
        Some(Reservation {
            registry: self.clone(),
            conversation_id: conversation_id.to_string(),
        })
    }

    pub fn is_busy(&self, conversation_id: &str) -> bool {
        self.lock().contains(conversation_id)
    }
}

/// Exclusive claim on one conversation
#[must_use = "dropping a reservation releases the conversation immediately"]
pub struct Reservation {
    registry: InFlightRegistry,
    conversation_id: String,
}

impl Reservation {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.conversation_id);
        tracing::debug!(conv_id = %self.conversation_id, "Released in-flight guard");
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("conversation_id", &self.conversation_id)
            .finish_non_exhaustive()
    }
}
