pub use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LanguageModelError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request to the provider failed or the parsing of the response
    /// failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The request returned a non-2xx status code, client or server.
    #[error("Status error: {1} (Status {0})")]
    StatusCode(StatusCode, String),
    /// The input is not supported by or is incompatible with the model
    /// (e.g. an image part inside an assistant message)
    #[error("Unsupported by {0}: {1}")]
    Unsupported(&'static str, String),
    /// The response from the provider was unexpected. (e.g. no choices returned
    /// in an `OpenAI` completion)
    #[error("Invariant from {0}: {1}")]
    Invariant(&'static str, String),
    /// The model refused to process the input. (e.g. `OpenAI` refusal)
    #[error("Refusal: {0}")]
    Refusal(String),
}

impl LanguageModelError {
    /// The HTTP status returned by the provider, if the failure came from a
    /// response rather than from the network or the library.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::StatusCode(status, _) => Some(*status),
            Self::Transport(error) => error.status(),
            _ => None,
        }
    }
}

pub type LanguageModelResult<T> = Result<T, LanguageModelError>;
