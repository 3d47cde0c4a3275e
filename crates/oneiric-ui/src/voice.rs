//! Voice input: record, release the microphone, transcribe into the
//! compose field.

use tokio::sync::watch;
use tracing::{error, info, warn};

use oneiric_audio::{Microphone, Recorder, SpectrumFrame};
use oneiric_core::error::OneiricError;
use oneiric_core::Recording;
use oneiric_gemini::InterpretationService;
use oneiric_session::Notifier;

use crate::compose::ComposeState;

pub const TRANSCRIPTION_FAILED_NOTICE: &str =
    "Не удалось распознать речь. Пожалуйста, проверьте соединение.";
pub const MICROPHONE_DENIED_NOTICE: &str = "Не удалось получить доступ к микрофону.";

/// Result of ending a voice capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// Recognised text was appended to the compose field.
    Merged(String),
    /// The service heard nothing; the field is unchanged.
    NoSpeech,
    /// Recording or transcription failed; a notice was shown.
    Failed,
    /// The service refused the key; the caller returns to the gate.
    CredentialRejected,
    NotRecording,
}

/// Couples a [`Recorder`] with the compose field's voice flags.
pub struct VoiceCapture<M> {
    recorder: Recorder<M>,
    visualize: bool,
    frames: Option<watch::Receiver<SpectrumFrame>>,
}

impl<M: Microphone> VoiceCapture<M> {
    pub fn new(recorder: Recorder<M>, visualize: bool) -> Self {
        Self {
            recorder,
            visualize,
            frames: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn limit_reached(&self) -> bool {
        self.recorder.limit_reached()
    }

    /// Spectrum frames of the running recording, if visualised.
    pub fn frames(&self) -> Option<watch::Receiver<SpectrumFrame>> {
        self.frames.clone()
    }

    /// Begin recording. A denied or missing microphone shows a notice and
    /// leaves the compose state untouched.
    pub async fn start(
        &mut self,
        compose: &mut ComposeState,
        processing: bool,
        notifier: &dyn Notifier,
    ) -> Result<(), OneiricError> {
        if compose.is_recording() || !compose.voice_enabled(processing) {
            return Err(OneiricError::Audio("Voice input is not available now".into()));
        }
        match self.recorder.start(self.visualize).await {
            Ok(frames) => {
                self.frames = frames;
                compose.set_recording(true);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Microphone access failed");
                notifier.notify(MICROPHONE_DENIED_NOTICE);
                Err(e)
            }
        }
    }

    /// Stop recording and release the microphone.
    ///
    /// The caller passes the recording on to
    /// [`transcribe_into`](Self::transcribe_into) or sends it for analysis.
    pub fn stop_recording(
        &mut self,
        compose: &mut ComposeState,
        notifier: &dyn Notifier,
    ) -> Option<Recording> {
        if !self.recorder.is_recording() {
            return None;
        }
        self.frames = None;
        compose.set_recording(false);
        match self.recorder.stop() {
            Ok(recording) => Some(recording),
            Err(e) => {
                error!(error = %e, "Failed to finalise recording");
                notifier.notify(TRANSCRIPTION_FAILED_NOTICE);
                None
            }
        }
    }

    /// Transcribe a finished recording and merge the text.
    pub async fn transcribe_into<S: InterpretationService>(
        &self,
        service: &S,
        recording: Recording,
        compose: &mut ComposeState,
        notifier: &dyn Notifier,
    ) -> VoiceOutcome {
        compose.set_transcribing(true);
        let result = service.transcribe(recording).await;
        compose.set_transcribing(false);

        match result {
            Ok(text) if text.trim().is_empty() => {
                info!("Transcription returned no speech");
                VoiceOutcome::NoSpeech
            }
            Ok(text) => {
                compose.merge_transcription(&text);
                VoiceOutcome::Merged(text)
            }
            Err(e) if e.is_credential_failure() => {
                warn!(error = %e, "Transcription refused the API key");
                VoiceOutcome::CredentialRejected
            }
            Err(e) => {
                warn!(error = %e, "Transcription failed");
                notifier.notify(TRANSCRIPTION_FAILED_NOTICE);
                VoiceOutcome::Failed
            }
        }
    }

    /// Stop, release the microphone, then transcribe.
    pub async fn finish<S: InterpretationService>(
        &mut self,
        service: &S,
        compose: &mut ComposeState,
        notifier: &dyn Notifier,
    ) -> VoiceOutcome {
        if !self.recorder.is_recording() {
            return VoiceOutcome::NotRecording;
        }
        match self.stop_recording(compose, notifier) {
            Some(recording) => {
                self.transcribe_into(service, recording, compose, notifier)
                    .await
            }
            None => VoiceOutcome::Failed,
        }
    }

    /// Abandon the recording without transcribing.
    pub fn cancel(&mut self, compose: &mut ComposeState) {
        self.frames = None;
        self.recorder.cancel();
        compose.set_recording(false);
    }
}
