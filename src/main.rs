//! Eco Chat - local back-end for an AI chat client
//!
//! Keeps conversations and settings on disk, runs the send-message
//! workflow against the preprocess/generate service, and serves the
//! result to the presentation layer over HTTP.

mod api;
mod chat;
mod config;
mod kv;
mod remote;
mod runtime;
mod settings;
mod workflow;

use api::{create_router, AppState};
use chat::ChatStore;
use config::ChatConfig;
use kv::KvStore;
use remote::{HttpAssistant, LoggingBackend};
use runtime::ChatService;
use settings::SettingsStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eco_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ChatConfig::from_env();

    // Ensure store directory exists
    if let Some(parent) = PathBuf::from(&config.store_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.store_path, "Opening store");
    let kv = KvStore::open(&config.store_path)?;

    let store = ChatStore::load(kv.clone())?;
    let settings =
        SettingsStore::load(kv, config.preferred_theme)?.with_events(store.event_sender());

    let mut theme_rx = settings.subscribe_theme();
    tokio::spawn(async move {
        while theme_rx.changed().await.is_ok() {
            let theme = *theme_rx.borrow_and_update();
            tracing::info!(theme = theme.as_str(), "Theme changed");
        }
    });

    let assistant = HttpAssistant::new(&config.api_base, config.request_timeout)?;
    tracing::info!(
        api_base = %config.api_base,
        timeout = ?config.request_timeout,
        "Assistant back-end configured"
    );
    let backend = LoggingBackend::new(Arc::new(assistant));

    let service = ChatService::new(store, settings, backend)
        .with_delays(config.display_delay, config.generate_delay);
    let state = AppState::new(service);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("Eco Chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
