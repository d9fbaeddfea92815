//! Server-Sent Events support
//!
//! Every stream opens with an `init` snapshot, then relays store changes.

use crate::chat::{ChatEvent, Conversation, Message};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// State sent to a client when it connects
#[derive(Debug, Serialize)]
pub struct InitSnapshot {
    pub conversations: Vec<Conversation>,
    pub active: Option<String>,
    pub messages: Vec<Message>,
    pub in_flight: bool,
    pub theme: String,
    pub language: String,
}

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init: InitSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<ChatEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(init_event(&init)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(chat_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn init_event(init: &InitSnapshot) -> Event {
    let mut data = serde_json::to_value(init).unwrap_or_else(|_| json!({}));
    if let Some(obj) = data.as_object_mut() {
        obj.insert("type".to_string(), json!("init"));
    }
    Event::default().event("init").data(data.to_string())
}

fn chat_event_to_axum(event: ChatEvent) -> Event {
    let (event_type, data) = event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn event_payload(event: ChatEvent) -> (&'static str, serde_json::Value) {
    match event {
        ChatEvent::MessageAdded(message) => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        ChatEvent::ConversationsChanged {
            conversations,
            active,
        } => (
            "conversations",
            json!({
                "type": "conversations",
                "conversations": conversations,
                "active": active
            }),
        ),
        ChatEvent::TurnFinished {
            conversation_id,
            outcome,
        } => (
            "turn_finished",
            json!({
                "type": "turn_finished",
                "conversation_id": conversation_id,
                "outcome": outcome
            }),
        ),
        ChatEvent::SettingsChanged { theme, language } => (
            "settings",
            json!({
                "type": "settings",
                "theme": theme,
                "language": language
            }),
        ),
    }
}
