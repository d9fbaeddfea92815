//! Wire types for the assistant endpoints

use super::RemoteError;
use serde::{Deserialize, Serialize};

/// Request body shared by preprocess and generate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Raw preprocess response body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessResponse {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub original_prompt: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Raw generate response body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body that may carry an `error` field on non-success responses
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Interpreted outcome of the preprocess step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessVerdict {
    /// Refuse the prompt, optionally explaining why
    Reject { message: Option<String> },
    /// Show a note, then generate from `original_prompt`
    InformAndPass {
        message: Option<String>,
        original_prompt: Option<String>,
    },
    /// Generate from `original_prompt` directly
    Pass { original_prompt: Option<String> },
    /// The preprocess step failed for any reason
    Error { detail: String },
}

impl PreprocessVerdict {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Reject { .. } => "reject",
            Self::InformAndPass { .. } => "inform_and_pass",
            Self::Pass { .. } => "pass",
            Self::Error { .. } => "error",
        }
    }
}

/// Empty strings count as absent
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl TryFrom<PreprocessResponse> for PreprocessVerdict {
    type Error = RemoteError;

    fn try_from(body: PreprocessResponse) -> Result<Self, RemoteError> {
        if let Some(error) = present(body.error) {
            return Err(RemoteError::service(error));
        }
        match body.action.as_deref() {
            Some("reject") => Ok(Self::Reject {
                message: present(body.message),
            }),
            Some("inform_and_pass") => Ok(Self::InformAndPass {
                message: present(body.message),
                original_prompt: present(body.original_prompt),
            }),
            Some("pass") => Ok(Self::Pass {
                original_prompt: present(body.original_prompt),
            }),
            Some("error") => Err(RemoteError::service(
                present(body.reason)
                    .or(present(body.message))
                    .unwrap_or_else(|| "preprocessing failed".to_string()),
            )),
            Some(other) => Err(RemoteError::protocol(format!(
                "unrecognized preprocess action: {other}"
            ))),
            None => Err(RemoteError::protocol("preprocess response has no action")),
        }
    }
}

impl GenerateResponse {
    /// The generated text, or why there is none
    pub fn into_text(self) -> Result<String, RemoteError> {
        if let Some(error) = present(self.error) {
            return Err(RemoteError::service(error));
        }
        present(self.response).ok_or_else(RemoteError::empty_response)
    }
}

/// An exported card from the back-end's marked list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedCard {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub excerpt: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportCardsResponse {
    #[serde(default)]
    pub cards: Vec<MarkedCard>,
}
