//! Remote interpretation client for Oneiric.
//!
//! Wraps the hosted Gemini `generateContent` endpoint behind the
//! [`InterpretationService`] trait: audio transcription, chat turns with a
//! fixed dream-interpreter persona, structured dream analysis and dream
//! illustrations. Includes a scripted mock for testing without network
//! access.

pub mod client;
pub mod error;
pub mod prompts;
pub mod service;
pub mod wire;

pub use client::{encode_audio, GeminiClient};
pub use error::GeminiError;
pub use service::{DreamInput, InterpretationService, MockInterpretationService};
