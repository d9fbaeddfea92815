//! Conversation store
//!
//! Holds the conversation list, the active conversation id and one
//! append-only message log per conversation. Every mutation is written
//! through to the key-value store and broadcast to subscribers.

mod types;

pub use types::{seed_conversations, Conversation, Message, Sender, NEW_CONVERSATION_PREVIEW};

use crate::kv::{KvError, KvStore};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::broadcast;

pub const MESSAGES_KEY: &str = "messages";
pub const CONVERSATIONS_KEY: &str = "conversations";
pub const ACTIVE_CONVERSATION_KEY: &str = "active_conversation";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Kv(#[from] KvError),
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("No active conversation")]
    NoActiveConversation,
    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Change notifications for the presentation layer
#[derive(Debug, Clone)]
pub enum ChatEvent {
    MessageAdded(Message),
    ConversationsChanged {
        conversations: Vec<Conversation>,
        active: Option<String>,
    },
    TurnFinished {
        conversation_id: String,
        outcome: String,
    },
    SettingsChanged {
        theme: String,
        language: String,
    },
}

#[derive(Debug, Default)]
struct ChatState {
    conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<Message>>,
    active: Option<String>,
    /// Highest message id handed out so far
    last_message_id: u64,
}

impl ChatState {
    fn next_message_id(&mut self, now: DateTime<Utc>) -> String {
        let stamp = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = stamp.max(self.last_message_id + 1);
        self.last_message_id = id;
        id.to_string()
    }

    fn conversation_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }
}

/// Shared handle to the conversation store
#[derive(Clone)]
pub struct ChatStore {
    kv: KvStore,
    state: Arc<Mutex<ChatState>>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatStore {
    /// Load state from `kv`, falling back to defaults for any missing entry
    pub fn load(kv: KvStore) -> StoreResult<Self> {
        let now = Utc::now();
        let conversations: Vec<Conversation> = kv
            .get(CONVERSATIONS_KEY)?
            .unwrap_or_else(|| seed_conversations(now));
        let messages: HashMap<String, Vec<Message>> = kv.get(MESSAGES_KEY)?.unwrap_or_default();
        let active: Option<String> = match kv.get::<Option<String>>(ACTIVE_CONVERSATION_KEY)? {
            Some(stored) => stored,
            None => conversations.first().map(|c| c.id.clone()),
        };

        let last_message_id = messages
            .values()
            .flatten()
            .filter_map(|m| m.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        tracing::info!(
            conversations = conversations.len(),
            messages = messages.values().map(Vec::len).sum::<usize>(),
            active = ?active,
            "Loaded chat state"
        );

        let (events, _) = broadcast::channel(256);
        Ok(Self {
            kv,
            state: Arc::new(Mutex::new(ChatState {
                conversations,
                messages,
                active,
                last_message_id,
            })),
            events,
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, ChatState>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Sender side of the change channel, shared with the settings store
    pub fn event_sender(&self) -> broadcast::Sender<ChatEvent> {
        self.events.clone()
    }

    /// Publish an event to subscribers (no-op when nobody listens)
    pub fn publish(&self, event: ChatEvent) {
        let _ = self.events.send(event);
    }

    // ==================== Queries ====================

    pub fn conversations(&self) -> StoreResult<Vec<Conversation>> {
        Ok(self.lock()?.conversations.clone())
    }

    pub fn active_conversation_id(&self) -> StoreResult<Option<String>> {
        Ok(self.lock()?.active.clone())
    }

    /// Messages of the active conversation
    pub fn messages(&self) -> StoreResult<Vec<Message>> {
        let state = self.lock()?;
        Ok(state
            .active
            .as_ref()
            .and_then(|id| state.messages.get(id))
            .cloned()
            .unwrap_or_default())
    }

    pub fn messages_for(&self, conversation_id: &str) -> StoreResult<Vec<Message>> {
        let state = self.lock()?;
        if !state.conversations.iter().any(|c| c.id == conversation_id) {
            return Err(StoreError::ConversationNotFound(conversation_id.to_string()));
        }
        Ok(state.messages.get(conversation_id).cloned().unwrap_or_default())
    }

    /// Conversations whose title contains `query`, ignoring case
    pub fn search_conversations(&self, query: &str) -> StoreResult<Vec<Conversation>> {
        let needle = query.trim().to_lowercase();
        let state = self.lock()?;
        Ok(state
            .conversations
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    // ==================== Mutations ====================

    /// Append a message to the active conversation
    #[allow(dead_code)] // Turns write to their bound conversation instead
    pub fn add_message(&self, content: &str, sender: Sender) -> StoreResult<Message> {
        let active = self
            .active_conversation_id()?
            .ok_or(StoreError::NoActiveConversation)?;
        self.add_message_to(&active, content, sender)
    }

    /// Append a message to a specific conversation and refresh its preview.
    ///
    /// An assistant message landing in a conversation that is not active
    /// marks that conversation unread.
    pub fn add_message_to(
        &self,
        conversation_id: &str,
        content: &str,
        sender: Sender,
    ) -> StoreResult<Message> {
        let message = {
            let mut state = self.lock()?;
            let is_active = state.active.as_deref() == Some(conversation_id);
            if state.conversation_mut(conversation_id).is_none() {
                return Err(StoreError::ConversationNotFound(conversation_id.to_string()));
            }

            // Keep each log ordered by created_at even if the clock steps back
            let mut created_at = Utc::now();
            if let Some(last) = state.messages.get(conversation_id).and_then(|log| log.last()) {
                created_at = created_at.max(last.created_at);
            }

            let message = Message {
                id: state.next_message_id(created_at),
                conversation_id: conversation_id.to_string(),
                content: content.to_string(),
                sender,
                created_at,
            };
            state
                .messages
                .entry(conversation_id.to_string())
                .or_default()
                .push(message.clone());

            if let Some(conv) = state.conversation_mut(conversation_id) {
                conv.last_message_preview = content.to_string();
                conv.updated_at = created_at;
                if sender == Sender::Assistant && !is_active {
                    conv.unread = true;
                }
            }

            // Written under the state lock so overlapping appends persist in order
            self.kv.set(MESSAGES_KEY, &state.messages)?;
            self.kv.set(CONVERSATIONS_KEY, &state.conversations)?;
            message
        };

        tracing::debug!(
            conv_id = %conversation_id,
            msg_id = %message.id,
            sender = ?sender,
            "Message appended"
        );
        self.publish(ChatEvent::MessageAdded(message.clone()));
        Ok(message)
    }

    /// Make `id` the active conversation and clear its unread flag
    pub fn set_active_conversation(&self, id: &str) -> StoreResult<()> {
        let conversations = {
            let mut state = self.lock()?;
            let conv = state
                .conversation_mut(id)
                .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;
            conv.unread = false;
            state.active = Some(id.to_string());
            self.kv.set(CONVERSATIONS_KEY, &state.conversations)?;
            self.kv.set(ACTIVE_CONVERSATION_KEY, &state.active)?;
            state.conversations.clone()
        };

        self.publish(ChatEvent::ConversationsChanged {
            conversations,
            active: Some(id.to_string()),
        });
        Ok(())
    }

    /// Create an empty conversation at the top of the list and activate it
    pub fn start_new_conversation(&self) -> StoreResult<Conversation> {
        let (conversation, conversations) = {
            let mut state = self.lock()?;
            let number = state.conversations.len() + 1;
            let conversation = Conversation::new(
                uuid::Uuid::new_v4().to_string(),
                format!("New Chat {number}"),
                NEW_CONVERSATION_PREVIEW,
                Utc::now(),
            );
            state.conversations.insert(0, conversation.clone());
            state.messages.insert(conversation.id.clone(), Vec::new());
            state.active = Some(conversation.id.clone());
            self.kv.set(CONVERSATIONS_KEY, &state.conversations)?;
            self.kv.set(MESSAGES_KEY, &state.messages)?;
            self.kv.set(ACTIVE_CONVERSATION_KEY, &state.active)?;
            (conversation, state.conversations.clone())
        };

        tracing::info!(
            conv_id = %conversation.id,
            title = %conversation.title,
            "Started conversation"
        );
        self.publish(ChatEvent::ConversationsChanged {
            conversations,
            active: Some(conversation.id.clone()),
        });
        Ok(conversation)
    }
}
