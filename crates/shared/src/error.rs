use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayError {
    /// Backend answered with a non-2xx status.
    #[error("request failed with status {status_code}")]
    Request { status_code: u16 },
    /// Request never completed (connect, timeout, TLS, aborted body).
    #[error("network error: {message}")]
    Network { message: String },
    /// Body matched none of the accepted response shapes.
    #[error("unexpected response shape: {message}")]
    Shape { message: String },
}

impl GatewayError {
    pub fn request(status_code: u16) -> Self {
        Self::Request { status_code }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { status_code } => Some(*status_code),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401 | 403))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::shape(value.to_string())
    }
}
