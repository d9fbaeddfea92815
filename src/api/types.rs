//! API request and response types

use crate::chat::{Conversation, Message};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

/// Request to change the interface language
#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Conversation list plus the active id
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
    pub active: Option<String>,
}

/// Response with a single conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation: Conversation,
}

/// One conversation's log
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub conversation_id: Option<String>,
    pub messages: Vec<Message>,
    /// Whether a turn is still running for this conversation
    pub in_flight: bool,
}

/// Response for a send request
#[derive(Debug, Serialize, Deserialize)]
pub struct SendResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub theme: String,
    pub language: String,
    pub dark_mode: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub key: String,
    pub text: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
