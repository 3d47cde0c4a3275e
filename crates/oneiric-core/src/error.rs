use thiserror::Error;

/// Top-level error type for the Oneiric client.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for OneiricError` so that `?` works across crate
/// boundaries. The two credential variants are kept distinct from generic
/// remote failures: the session controller reacts to them by returning to
/// the credential gate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OneiricError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Microphone unavailable: {0}")]
    Microphone(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("API key not found")]
    MissingCredential,

    #[error("API key invalid or project not found")]
    InvalidCredential,

    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OneiricError {
    /// Whether this error means the selected API key must be chosen again.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            OneiricError::MissingCredential | OneiricError::InvalidCredential
        )
    }
}

impl From<toml::de::Error> for OneiricError {
    fn from(err: toml::de::Error) -> Self {
        OneiricError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OneiricError {
    fn from(err: toml::ser::Error) -> Self {
        OneiricError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OneiricError {
    fn from(err: serde_json::Error) -> Self {
        OneiricError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Oneiric operations.
pub type Result<T> = std::result::Result<T, OneiricError>;
