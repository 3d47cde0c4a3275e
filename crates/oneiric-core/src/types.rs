use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OneiricError;

// =============================================================================
// Conversation
// =============================================================================

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Wire name used by the remote service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of the conversation transcript. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    text: String,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Whether an API key has been selected.
///
/// `Unknown` is the state before the one-shot capability probe completes;
/// nothing is rendered while in it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ApiKeyState {
    #[default]
    Unknown,
    /// No key selected (or no provider available): show the gate screen.
    Gated,
    /// A key is assumed selected: show the chat.
    Authorized,
}

impl fmt::Display for ApiKeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeyState::Unknown => write!(f, "Unknown"),
            ApiKeyState::Gated => write!(f, "Gated"),
            ApiKeyState::Authorized => write!(f, "Authorized"),
        }
    }
}

impl ApiKeyState {
    /// Returns whether a transition from `self` to `target` is valid.
    ///
    /// `Unknown` is left exactly once, by the capability probe, and is never
    /// re-entered.
    pub fn can_transition_to(&self, target: &ApiKeyState) -> bool {
        matches!(
            (self, target),
            (ApiKeyState::Unknown, ApiKeyState::Gated)
                | (ApiKeyState::Unknown, ApiKeyState::Authorized)
                | (ApiKeyState::Gated, ApiKeyState::Authorized)
                | (ApiKeyState::Authorized, ApiKeyState::Gated)
        )
    }
}

// =============================================================================
// Dream analysis
// =============================================================================

/// Emotional intensities of a dream, each expected in `[0, 100]`.
///
/// Absent keys deserialize as 0. Out-of-range values are kept as given.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DreamEmotions {
    pub fear: f64,
    pub joy: f64,
    pub confusion: f64,
    pub peace: f64,
    pub urgency: f64,
    pub insight: f64,
}

/// A symbol found in the dream and its interpretation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySymbol {
    pub symbol: String,
    pub meaning: String,
}

/// Structured interpretation of a dream, produced whole by one remote call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamAnalysis {
    #[serde(default)]
    pub transcription: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub interpretation: String,
    #[serde(default)]
    pub key_symbols: Vec<KeySymbol>,
    #[serde(default)]
    pub emotions: DreamEmotions,
    #[serde(default)]
    pub image_prompt: String,
}

/// Resolution requested for a generated dream illustration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1K")]
    Size1K,
    #[serde(rename = "2K")]
    Size2K,
    #[serde(rename = "4K")]
    Size4K,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Size1K => "1K",
            ImageSize::Size2K => "2K",
            ImageSize::Size4K => "4K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = OneiricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(ImageSize::Size1K),
            "2K" => Ok(ImageSize::Size2K),
            "4K" => Ok(ImageSize::Size4K),
            other => Err(OneiricError::Config(format!(
                "unknown image size '{}', expected 1K, 2K or 4K",
                other
            ))),
        }
    }
}

/// Image bytes returned by the remote image model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

// =============================================================================
// Audio
// =============================================================================

/// MIME type assumed for recordings that carry none.
pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// A finished microphone recording.
///
/// Consumed by value by the transcription call, so each recording is sent
/// at most once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recording {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Recording {
    pub fn new(bytes: Vec<u8>, mime_type: Option<String>) -> Self {
        Self {
            bytes,
            mime_type,
            recorded_at: Utc::now(),
        }
    }

    /// The MIME type to send, defaulting to `audio/webm`.
    pub fn effective_mime_type(&self) -> &str {
        match self.mime_type.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => DEFAULT_AUDIO_MIME,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
