//! Error types for the conversation session.

use oneiric_core::error::OneiricError;
use oneiric_core::ApiKeyState;
use oneiric_gemini::GeminiError;

/// Errors from the session controller and its bridges.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("no API key selected (state: {0})")]
    NotAuthorized(ApiKeyState),
    #[error("a request is already in progress")]
    Busy,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("invalid key state transition: {from} -> {to}")]
    InvalidTransition { from: ApiKeyState, to: ApiKeyState },
    #[error("credential provider error: {0}")]
    Provider(String),
    #[error(transparent)]
    Remote(#[from] GeminiError),
}

impl From<SessionError> for OneiricError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Remote(remote) => remote.into(),
            other => OneiricError::Session(other.to_string()),
        }
    }
}
