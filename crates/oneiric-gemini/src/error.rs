//! Error types for the remote interpretation client.

use oneiric_core::error::OneiricError;

/// Marker the remote service puts in its error message when the project
/// behind the API key cannot be found (expired or revoked key).
pub const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// Errors from the remote interpretation client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeminiError {
    #[error("API key not found")]
    MissingCredential,
    #[error("API key invalid or project not found")]
    InvalidCredential,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("response contained no image")]
    NoImage,
}

impl GeminiError {
    /// Whether the caller should send the user back to key selection.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            GeminiError::MissingCredential | GeminiError::InvalidCredential
        )
    }

    /// Translate a non-success response body into an error.
    ///
    /// Bodies carrying the "entity not found" marker become
    /// [`GeminiError::InvalidCredential`]; anything else keeps the status and
    /// the service's message (or the raw body when it is not JSON).
    pub fn from_error_body(status: u16, body: &str) -> Self {
        if body.contains(ENTITY_NOT_FOUND) {
            return GeminiError::InvalidCredential;
        }
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());
        GeminiError::Api { status, message }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if message.contains(ENTITY_NOT_FOUND) {
            GeminiError::InvalidCredential
        } else {
            GeminiError::Http(message)
        }
    }
}

impl From<GeminiError> for OneiricError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::MissingCredential => OneiricError::MissingCredential,
            GeminiError::InvalidCredential => OneiricError::InvalidCredential,
            other => OneiricError::Remote(other.to_string()),
        }
    }
}
