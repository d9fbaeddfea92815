//! HTTP API for the chat client
//!
//! Exposes the conversation and settings stores, the send operation, a
//! change stream and the export proxy to the presentation layer.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::ProductionService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProductionService>,
}

impl AppState {
    pub fn new(service: ProductionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
