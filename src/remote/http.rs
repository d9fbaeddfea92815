//! HTTP implementation of the assistant back-end

use super::types::{
    ErrorBody, ExportCardsResponse, GenerateResponse, MarkedCard, PreprocessResponse,
    PreprocessVerdict, PromptRequest,
};
use super::{AssistantBackend, RemoteError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the preprocess/generate/export service
pub struct HttpAssistant {
    client: Client,
    base_url: String,
}

impl HttpAssistant {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, RemoteError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RemoteError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn post_prompt(&self, path: &str, prompt: &str) -> Result<Response, RemoteError> {
        let response = self
            .client
            .post(self.url(path))
            .json(&PromptRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn get(&self, path: &str) -> Result<Response, RemoteError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::check_status(response).await
    }

    /// Turn a non-success status into an error, keeping the body's
    /// `error` field as detail when there is one
    async fn check_status(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
            .and_then(|body| body.error);
        Err(RemoteError::status(status.as_u16(), detail))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| RemoteError::decode(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistant {
    async fn preprocess(&self, prompt: &str) -> Result<PreprocessVerdict, RemoteError> {
        let response = self.post_prompt("preprocess", prompt).await?;
        let body: PreprocessResponse = Self::decode(response).await?;
        PreprocessVerdict::try_from(body)
    }

    async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        let response = self.post_prompt("generate", prompt).await?;
        let body: GenerateResponse = Self::decode(response).await?;
        body.into_text()
    }

    async fn export_cards(&self) -> Result<Vec<MarkedCard>, RemoteError> {
        let response = self.get("export/json").await?;
        let body: ExportCardsResponse = Self::decode(response).await?;
        Ok(body.cards)
    }

    async fn export_pdf(&self) -> Result<Vec<u8>, RemoteError> {
        let response = self.get("export/pdf").await?;
        Ok(response.bytes().await?.to_vec())
    }
}
