//! Conversation and message records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// A single chat message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
}

/// Conversation metadata shown in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub last_message_preview: String,
    pub updated_at: DateTime<Utc>,
    pub unread: bool,
}

impl Conversation {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        preview: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            last_message_preview: preview.into(),
            updated_at,
            unread: false,
        }
    }
}

/// Preview shown for a freshly started conversation
pub const NEW_CONVERSATION_PREVIEW: &str = "How can I help you?";

/// Conversations present before anything has been stored
pub fn seed_conversations(now: DateTime<Utc>) -> Vec<Conversation> {
    vec![
        Conversation::new("1", "Getting Started", "How can I help you today?", now),
        Conversation::new(
            "2",
            "Project Ideas",
            "What kind of project would you like to build?",
            now - Duration::hours(1),
        ),
        Conversation::new(
            "3",
            "Technical Support",
            "Have you tried restarting your device?",
            now - Duration::hours(24),
        ),
    ]
}
