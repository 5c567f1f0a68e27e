use proofit_sdk::{LanguageModelError, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CritiqueError {
    /// The request was rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A model call did not finish within the configured bound.
    #[error("Model call timed out after {0:?}")]
    GenerationTimeout(Duration),
    /// The provider or the network failed. Carries the upstream status when
    /// the provider answered with a non-2xx response.
    #[error("Upstream error: {0}")]
    Upstream(#[from] LanguageModelError),
}

impl CritiqueError {
    /// The HTTP status a caller should see for this error.
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::GenerationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream(error) => error.status().unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::GenerationTimeout(_) => "generation_timeout",
            Self::Upstream(_) => "upstream_error",
        }
    }

    /// Structured form returned to callers.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        let details = match self {
            Self::Upstream(LanguageModelError::StatusCode(_, body)) if !body.is_empty() => {
                Some(body.clone())
            }
            _ => None,
        };
        ErrorBody {
            error: self.to_string(),
            details,
            status: self.http_status().as_u16(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status: u16,
}
