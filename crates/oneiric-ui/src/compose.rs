//! The compose field: typed text plus the voice-input flags.

pub const PLACEHOLDER_IDLE: &str = "Напишите сообщение...";
pub const PLACEHOLDER_RECORDING: &str = "Говорите...";
pub const PLACEHOLDER_TRANSCRIBING: &str = "Распознавание...";

/// State of the message being composed.
///
/// Transcribed speech is merged into the field, never sent automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeState {
    text: String,
    recording: bool,
    transcribing: bool,
}

impl ComposeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_transcribing(&self) -> bool {
        self.transcribing
    }

    pub(crate) fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    pub(crate) fn set_transcribing(&mut self, transcribing: bool) {
        self.transcribing = transcribing;
    }

    /// Typing is blocked while voice input or a turn is in progress.
    pub fn input_enabled(&self, processing: bool) -> bool {
        !(processing || self.recording || self.transcribing)
    }

    /// The record button is usable when neither a turn nor a transcription
    /// is running.
    pub fn voice_enabled(&self, processing: bool) -> bool {
        !(processing || self.transcribing)
    }

    pub fn can_submit(&self, processing: bool) -> bool {
        self.input_enabled(processing) && !self.text.trim().is_empty()
    }

    pub fn placeholder(&self) -> &'static str {
        if self.recording {
            PLACEHOLDER_RECORDING
        } else if self.transcribing {
            PLACEHOLDER_TRANSCRIBING
        } else {
            PLACEHOLDER_IDLE
        }
    }

    /// Append recognised speech, separated from existing text by a space.
    pub fn merge_transcription(&mut self, transcript: &str) {
        if transcript.is_empty() {
            return;
        }
        if self.text.is_empty() {
            self.text = transcript.to_string();
        } else {
            self.text = format!("{} {}", self.text, transcript);
        }
    }

    /// Take the text for sending, clearing the field.
    ///
    /// Blank text stays in place and yields `None`.
    pub fn take_submission(&mut self) -> Option<String> {
        if self.text.trim().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_appends_with_space() {
        let mut compose = ComposeState::new();
        compose.set_text("hello");
        compose.merge_transcription("world");
        assert_eq!(compose.text(), "hello world");
    }

    #[test]
    fn test_merge_into_empty_field() {
        let mut compose = ComposeState::new();
        compose.merge_transcription("Мне снился лес");
        assert_eq!(compose.text(), "Мне снился лес");
    }

    #[test]
    fn test_merge_empty_transcript_is_noop() {
        let mut compose = ComposeState::new();
        compose.set_text("draft");
        compose.merge_transcription("");
        assert_eq!(compose.text(), "draft");
    }

    #[test]
    fn test_take_submission_clears() {
        let mut compose = ComposeState::new();
        compose.set_text("  сон  ");
        assert_eq!(compose.take_submission().as_deref(), Some("  сон  "));
        assert_eq!(compose.text(), "");
    }

    #[test]
    fn test_take_blank_submission() {
        let mut compose = ComposeState::new();
        compose.set_text("   ");
        assert_eq!(compose.take_submission(), None);
        assert_eq!(compose.text(), "   ");
    }

    #[test]
    fn test_input_disabled_while_busy() {
        let mut compose = ComposeState::new();
        compose.set_text("x");
        assert!(compose.input_enabled(false));
        assert!(compose.can_submit(false));
        assert!(!compose.input_enabled(true));
        assert!(!compose.can_submit(true));

        compose.set_recording(true);
        assert!(!compose.input_enabled(false));
        assert!(compose.voice_enabled(false));
        assert_eq!(compose.placeholder(), PLACEHOLDER_RECORDING);

        compose.set_recording(false);
        compose.set_transcribing(true);
        assert!(!compose.input_enabled(false));
        assert!(!compose.voice_enabled(false));
        assert_eq!(compose.placeholder(), PLACEHOLDER_TRANSCRIBING);
    }

    #[test]
    fn test_placeholder_idle() {
        assert_eq!(ComposeState::new().placeholder(), PLACEHOLDER_IDLE);
    }
}
