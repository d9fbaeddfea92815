//! Remote call error types

use thiserror::Error;

/// Failure of a preprocess, generate or export call
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn status(status: u16, detail: Option<String>) -> Self {
        let message = match detail {
            Some(detail) => format!("HTTP {status}: {detail}"),
            None => format!("HTTP {status}"),
        };
        Self::new(RemoteErrorKind::Status(status), message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Decode, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Service, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Protocol, message)
    }

    pub fn empty_response() -> Self {
        Self::new(RemoteErrorKind::EmptyResponse, "empty response from model")
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::decode(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::status(status.as_u16(), None)
        } else {
            RemoteError::network(e.to_string())
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Connection refused, DNS, timeout
    Network,
    /// Non-success HTTP status
    Status(u16),
    /// Body was not the expected JSON
    Decode,
    /// Body carried an explicit `error` field
    Service,
    /// Body parsed but made no sense (unknown action tag)
    Protocol,
    /// Generation succeeded with nothing to show
    EmptyResponse,
}

impl RemoteErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Status(_) => "status",
            Self::Decode => "decode",
            Self::Service => "service",
            Self::Protocol => "protocol",
            Self::EmptyResponse => "empty_response",
        }
    }
}
