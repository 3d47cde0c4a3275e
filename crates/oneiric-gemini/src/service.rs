//! The interpretation service seam and its scripted mock.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use oneiric_core::{ChatMessage, DreamAnalysis, GeneratedImage, ImageSize, Recording};

use crate::error::GeminiError;
use crate::prompts::EMPTY_REPLY_FALLBACK;

/// What a structured dream analysis is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DreamInput {
    Text(String),
    Audio(Recording),
}

/// Remote operations used by the session controller and the capture surface.
///
/// Implementations resolve the API key on every call and fail with
/// [`GeminiError::MissingCredential`] before any I/O when none is set.
pub trait InterpretationService: Send + Sync {
    /// Transcribe a recording into Russian text.
    ///
    /// Returns an empty string when the service finds no speech.
    fn transcribe(
        &self,
        recording: Recording,
    ) -> impl Future<Output = Result<String, GeminiError>> + Send;

    /// Answer `message` in the context of the prior `history`.
    ///
    /// Never returns an empty string: an empty reply becomes a fixed fallback.
    fn send_turn(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> impl Future<Output = Result<String, GeminiError>> + Send;

    /// Produce a complete structured analysis of a dream.
    fn analyze_dream(
        &self,
        input: DreamInput,
    ) -> impl Future<Output = Result<DreamAnalysis, GeminiError>> + Send;

    /// Render an illustration for an analysis image prompt.
    fn generate_image(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> impl Future<Output = Result<GeneratedImage, GeminiError>> + Send;
}

impl<T: InterpretationService> InterpretationService for Arc<T> {
    fn transcribe(
        &self,
        recording: Recording,
    ) -> impl Future<Output = Result<String, GeminiError>> + Send {
        (**self).transcribe(recording)
    }

    fn send_turn(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> impl Future<Output = Result<String, GeminiError>> + Send {
        (**self).send_turn(history, message)
    }

    fn analyze_dream(
        &self,
        input: DreamInput,
    ) -> impl Future<Output = Result<DreamAnalysis, GeminiError>> + Send {
        (**self).analyze_dream(input)
    }

    fn generate_image(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> impl Future<Output = Result<GeneratedImage, GeminiError>> + Send {
        (**self).generate_image(prompt, size)
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// A chat turn as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTurn {
    pub history: Vec<ChatMessage>,
    pub message: String,
}

#[derive(Debug, Default)]
struct MockScript {
    replies: VecDeque<Result<String, GeminiError>>,
    transcriptions: VecDeque<Result<String, GeminiError>>,
    analyses: VecDeque<Result<DreamAnalysis, GeminiError>>,
    images: VecDeque<Result<GeneratedImage, GeminiError>>,
    turns: Vec<RecordedTurn>,
    transcribed: Vec<Recording>,
}

/// Scripted interpretation service for tests.
///
/// Each operation pops the next scripted result; an exhausted script answers
/// with a canned success. Optional gates hold `send_turn`, `analyze_dream`
/// or `generate_image` until released, so tests can observe a call in flight.
#[derive(Debug, Clone, Default)]
pub struct MockInterpretationService {
    script: Arc<Mutex<MockScript>>,
    turn_gate: Option<Arc<Notify>>,
    analysis_gate: Option<Arc<Notify>>,
    image_gate: Option<Arc<Notify>>,
}

impl MockInterpretationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every `send_turn` until `gate` is notified.
    pub fn with_turn_gate(mut self, gate: Arc<Notify>) -> Self {
        self.turn_gate = Some(gate);
        self
    }

    /// Hold every `analyze_dream` until `gate` is notified.
    pub fn with_analysis_gate(mut self, gate: Arc<Notify>) -> Self {
        self.analysis_gate = Some(gate);
        self
    }

    /// Hold every `generate_image` until `gate` is notified.
    pub fn with_image_gate(mut self, gate: Arc<Notify>) -> Self {
        self.image_gate = Some(gate);
        self
    }

    pub fn push_reply(&self, reply: Result<String, GeminiError>) {
        self.lock().replies.push_back(reply);
    }

    pub fn push_transcription(&self, text: Result<String, GeminiError>) {
        self.lock().transcriptions.push_back(text);
    }

    pub fn push_analysis(&self, analysis: Result<DreamAnalysis, GeminiError>) {
        self.lock().analyses.push_back(analysis);
    }

    pub fn push_image(&self, image: Result<GeneratedImage, GeminiError>) {
        self.lock().images.push_back(image);
    }

    /// Every chat turn received so far, in order.
    pub fn turns(&self) -> Vec<RecordedTurn> {
        self.lock().turns.clone()
    }

    /// Every recording received by `transcribe`, in order.
    pub fn transcribed(&self) -> Vec<Recording> {
        self.lock().transcribed.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockScript> {
        self.script.lock().expect("mock script mutex poisoned")
    }
}

impl InterpretationService for MockInterpretationService {
    async fn transcribe(&self, recording: Recording) -> Result<String, GeminiError> {
        let mut script = self.lock();
        script.transcribed.push(recording);
        script
            .transcriptions
            .pop_front()
            .unwrap_or_else(|| Ok("[mock transcription]".to_string()))
    }

    async fn send_turn(&self, history: &[ChatMessage], message: &str) -> Result<String, GeminiError> {
        self.lock().turns.push(RecordedTurn {
            history: history.to_vec(),
            message: message.to_string(),
        });
        if let Some(gate) = &self.turn_gate {
            gate.notified().await;
        }
        let reply = self
            .lock()
            .replies
            .pop_front()
            .unwrap_or_else(|| Ok(format!("[mock reply to: {}]", message)));
        reply.map(|text| {
            if text.is_empty() {
                EMPTY_REPLY_FALLBACK.to_string()
            } else {
                text
            }
        })
    }

    async fn analyze_dream(&self, input: DreamInput) -> Result<DreamAnalysis, GeminiError> {
        if let Some(gate) = &self.analysis_gate {
            gate.notified().await;
        }
        if let Some(next) = self.lock().analyses.pop_front() {
            return next;
        }
        let transcription = match input {
            DreamInput::Text(text) => text,
            DreamInput::Audio(_) => "[mock transcription]".to_string(),
        };
        Ok(DreamAnalysis {
            transcription,
            title: "[mock title]".to_string(),
            summary: String::new(),
            interpretation: "[mock interpretation]".to_string(),
            key_symbols: Vec::new(),
            emotions: Default::default(),
            image_prompt: "[mock image prompt]".to_string(),
        })
    }

    async fn generate_image(
        &self,
        _prompt: &str,
        _size: ImageSize,
    ) -> Result<GeneratedImage, GeminiError> {
        if let Some(gate) = &self.image_gate {
            gate.notified().await;
        }
        self.lock().images.pop_front().unwrap_or_else(|| {
            Ok(GeneratedImage {
                bytes: vec![0x89, b'P', b'N', b'G'],
                mime_type: "image/png".to_string(),
            })
        })
    }
}
