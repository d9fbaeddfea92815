//! HTTP request handlers

use super::sse::{sse_stream, InitSnapshot};
use super::types::{
    ConversationListResponse, ConversationResponse, ErrorResponse, LanguageRequest,
    MessagesResponse, SearchQuery, SendRequest, SendResponse, SettingsResponse,
    TranslationResponse,
};
use super::AppState;
use crate::chat::StoreError;
use crate::kv::KvError;
use crate::remote::{AssistantBackend, ExportCardsResponse, RemoteError};
use crate::settings::Language;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Conversations
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/search", get(search_conversations))
        .route("/api/conversations/new", post(create_conversation))
        .route("/api/conversations/:id/activate", post(activate_conversation))
        .route("/api/conversations/:id/messages", get(conversation_messages))
        // Active conversation log and send
        .route("/api/messages", get(active_messages).post(send_message))
        // Settings
        .route("/api/settings", get(get_settings))
        .route("/api/settings/theme/toggle", post(toggle_theme))
        .route("/api/settings/language", post(set_language))
        .route("/api/translate/:key", get(translate))
        // Change stream
        .route("/api/stream", get(stream))
        // Export proxy
        .route("/api/export/json", get(export_json))
        .route("/api/export/pdf", get(export_pdf))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversations
// ============================================================

async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<ConversationListResponse>, AppError> {
    conversation_list(&state).map(Json)
}

async fn search_conversations(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ConversationListResponse>, AppError> {
    let store = state.service.store();
    Ok(Json(ConversationListResponse {
        conversations: store.search_conversations(&query.q)?,
        active: store.active_conversation_id()?,
    }))
}

async fn create_conversation(
    State(state): State<AppState>,
) -> Result<Json<ConversationResponse>, AppError> {
    let conversation = state.service.store().start_new_conversation()?;
    Ok(Json(ConversationResponse { conversation }))
}

async fn activate_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationListResponse>, AppError> {
    state.service.store().set_active_conversation(&id)?;
    conversation_list(&state).map(Json)
}

async fn conversation_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state.service.store().messages_for(&id)?;
    Ok(Json(MessagesResponse {
        in_flight: state.service.is_busy(&id),
        conversation_id: Some(id),
        messages,
    }))
}

fn conversation_list(state: &AppState) -> Result<ConversationListResponse, AppError> {
    let store = state.service.store();
    Ok(ConversationListResponse {
        conversations: store.conversations()?,
        active: store.active_conversation_id()?,
    })
}

// ============================================================
// Messages
// ============================================================

async fn active_messages(
    State(state): State<AppState>,
) -> Result<Json<MessagesResponse>, AppError> {
    let store = state.service.store();
    let conversation_id = store.active_conversation_id()?;
    Ok(Json(MessagesResponse {
        in_flight: conversation_id
            .as_deref()
            .is_some_and(|id| state.service.is_busy(id)),
        messages: store.messages()?,
        conversation_id,
    }))
}

/// Record the user message and hand the rest of the turn to a task
async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Json<SendResponse> {
    match state.service.begin_turn(&req.text) {
        Ok(turn) => {
            tracing::debug!(conv_id = %turn.conversation_id(), "Send accepted");
            tokio::spawn(turn.run());
            Json(SendResponse {
                accepted: true,
                reason: None,
            })
        }
        Err(reason) => Json(SendResponse {
            accepted: false,
            reason: Some(reason.as_str().to_string()),
        }),
    }
}

// ============================================================
// Settings
// ============================================================

async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(settings_response(&state))
}

async fn toggle_theme(State(state): State<AppState>) -> Result<Json<SettingsResponse>, AppError> {
    state.service.settings().toggle_theme()?;
    Ok(Json(settings_response(&state)))
}

async fn set_language(
    State(state): State<AppState>,
    Json(req): Json<LanguageRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    let language: Language = req
        .language
        .parse()
        .map_err(|e: crate::settings::UnknownLanguage| AppError::BadRequest(e.to_string()))?;
    state.service.settings().set_language(language)?;
    Ok(Json(settings_response(&state)))
}

async fn translate(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<TranslationResponse> {
    let text = state.service.settings().translate(&key);
    Json(TranslationResponse { key, text })
}

fn settings_response(state: &AppState) -> SettingsResponse {
    let settings = state.service.settings();
    SettingsResponse {
        theme: settings.theme().as_str().to_string(),
        language: settings.language().code().to_string(),
        dark_mode: settings.dark_mode(),
    }
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let store = state.service.store();
    // Subscribe before taking the snapshot so no change falls in between
    let rx = store.subscribe();

    let active = store.active_conversation_id()?;
    let settings = state.service.settings();
    let init = InitSnapshot {
        conversations: store.conversations()?,
        in_flight: active
            .as_deref()
            .is_some_and(|id| state.service.is_busy(id)),
        messages: store.messages()?,
        active,
        theme: settings.theme().as_str().to_string(),
        language: settings.language().code().to_string(),
    };

    Ok(sse_stream(init, rx))
}

// ============================================================
// Export Proxy
// ============================================================

async fn export_json(
    State(state): State<AppState>,
) -> Result<Json<ExportCardsResponse>, AppError> {
    let cards = state.service.backend().export_cards().await?;
    Ok(Json(ExportCardsResponse { cards }))
}

async fn export_pdf(State(state): State<AppState>) -> Result<Response, AppError> {
    let bytes = state.service.backend().export_pdf().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"marked_cards.pdf\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn get_version() -> &'static str {
    concat!("eco-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
    BadGateway(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConversationNotFound(_) => AppError::NotFound(e.to_string()),
            StoreError::NoActiveConversation => AppError::BadRequest(e.to_string()),
            StoreError::Kv(_) | StoreError::Poisoned => AppError::Internal(e.to_string()),
        }
    }
}

impl From<KvError> for AppError {
    fn from(e: KvError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        AppError::BadGateway(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
