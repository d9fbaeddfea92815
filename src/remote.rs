//! Remote assistant endpoints
//!
//! The preprocess and generate services are opaque HTTP black boxes. This
//! module hides them behind [`AssistantBackend`] so the workflow can run
//! against mocks in tests.

mod error;
mod http;
mod types;

pub use error::RemoteError;
#[cfg(test)]
pub use error::RemoteErrorKind;
pub use http::HttpAssistant;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for the assistant back-end
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Screen a raw prompt before generation
    async fn preprocess(&self, prompt: &str) -> Result<PreprocessVerdict, RemoteError>;

    /// Generate a reply for a screened prompt
    async fn generate(&self, prompt: &str) -> Result<String, RemoteError>;

    /// Fetch the back-end's marked cards
    async fn export_cards(&self) -> Result<Vec<MarkedCard>, RemoteError>;

    /// Fetch the marked cards rendered as a PDF
    async fn export_pdf(&self) -> Result<Vec<u8>, RemoteError>;
}

#[async_trait]
impl<T: AssistantBackend + ?Sized> AssistantBackend for Arc<T> {
    async fn preprocess(&self, prompt: &str) -> Result<PreprocessVerdict, RemoteError> {
        (**self).preprocess(prompt).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        (**self).generate(prompt).await
    }

    async fn export_cards(&self) -> Result<Vec<MarkedCard>, RemoteError> {
        (**self).export_cards().await
    }

    async fn export_pdf(&self) -> Result<Vec<u8>, RemoteError> {
        (**self).export_pdf().await
    }
}

/// Logging wrapper for assistant back-ends
pub struct LoggingBackend {
    inner: Arc<dyn AssistantBackend>,
}

impl LoggingBackend {
    pub fn new(inner: Arc<dyn AssistantBackend>) -> Self {
        Self { inner }
    }

    fn log_outcome<T>(call: &str, started: std::time::Instant, result: &Result<T, RemoteError>) {
        let duration_ms = started.elapsed().as_millis();
        match result {
            Ok(_) => {
                tracing::info!(call, duration_ms = %duration_ms, "Remote call completed");
            }
            Err(e) => {
                tracing::error!(
                    call,
                    duration_ms = %duration_ms,
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Remote call failed"
                );
            }
        }
    }
}

#[async_trait]
impl AssistantBackend for LoggingBackend {
    async fn preprocess(&self, prompt: &str) -> Result<PreprocessVerdict, RemoteError> {
        let start = std::time::Instant::now();
        let result = self.inner.preprocess(prompt).await;
        Self::log_outcome("preprocess", start, &result);
        if let Ok(verdict) = &result {
            tracing::debug!(action = verdict.tag(), "Preprocess verdict");
        }
        result
    }

    async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(prompt).await;
        Self::log_outcome("generate", start, &result);
        result
    }

    async fn export_cards(&self) -> Result<Vec<MarkedCard>, RemoteError> {
        let start = std::time::Instant::now();
        let result = self.inner.export_cards().await;
        Self::log_outcome("export_json", start, &result);
        result
    }

    async fn export_pdf(&self) -> Result<Vec<u8>, RemoteError> {
        let start = std::time::Instant::now();
        let result = self.inner.export_pdf().await;
        Self::log_outcome("export_pdf", start, &result);
        result
    }
}
