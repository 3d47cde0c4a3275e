//! Voice-message recorder.
//!
//! Owns a microphone stream for the length of one recording. Teardown (stop
//! the visualiser, stop every track) runs on every exit path: `stop`,
//! `cancel`, a failed encode, or the recorder simply being dropped.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use oneiric_core::config::AudioConfig;
use oneiric_core::error::OneiricError;
use oneiric_core::types::Recording;

use crate::analyser::FrequencyAnalyser;
use crate::convert::{encode_wav, WAV_MIME};
use crate::visualizer::{SpectrumFrame, Visualizer, VisualizerGuard};
use crate::{Microphone, MicrophoneStream};

struct ActiveRecording {
    stream: Box<dyn MicrophoneStream>,
    visualizer: Option<VisualizerGuard>,
    started_at: Instant,
}

impl ActiveRecording {
    fn teardown(&mut self) {
        if let Some(mut visualizer) = self.visualizer.take() {
            visualizer.stop();
        }
        if self.stream.is_live() {
            self.stream.stop_tracks();
        }
    }
}

impl Drop for ActiveRecording {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Records one voice message at a time from a [`Microphone`].
pub struct Recorder<M> {
    microphone: M,
    fft_size: usize,
    visualizer_fps: u32,
    max_duration: Duration,
    active: Option<ActiveRecording>,
}

impl<M: Microphone> Recorder<M> {
    pub fn new(microphone: M, config: &AudioConfig) -> Self {
        Self {
            microphone,
            fft_size: config.fft_size,
            visualizer_fps: config.visualizer_fps,
            max_duration: Duration::from_secs(u64::from(config.max_recording_secs)),
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Time since `start`, or zero when idle.
    pub fn elapsed(&self) -> Duration {
        self.active
            .as_ref()
            .map(|a| a.started_at.elapsed())
            .unwrap_or_default()
    }

    /// Whether the configured maximum recording length has been reached.
    pub fn limit_reached(&self) -> bool {
        self.is_recording() && self.elapsed() >= self.max_duration
    }

    /// Acquire the microphone and begin recording.
    ///
    /// With `visualize` set, also spawns the spectrum task and returns the
    /// receiver for its frames.
    pub async fn start(
        &mut self,
        visualize: bool,
    ) -> Result<Option<watch::Receiver<SpectrumFrame>>, OneiricError> {
        if self.active.is_some() {
            return Err(OneiricError::Audio("Recording already in progress".into()));
        }

        let stream = self.microphone.open().await.map_err(|e| match e {
            OneiricError::Microphone(_) => e,
            other => OneiricError::Microphone(other.to_string()),
        })?;

        let (visualizer, frames) = if visualize {
            let (guard, rx) = Visualizer::spawn(
                stream.analyser_source(),
                FrequencyAnalyser::new(self.fft_size),
                self.visualizer_fps,
            );
            (Some(guard), Some(rx))
        } else {
            (None, None)
        };

        info!(sample_rate = stream.sample_rate(), visualize, "Recording started");
        self.active = Some(ActiveRecording {
            stream,
            visualizer,
            started_at: Instant::now(),
        });
        Ok(frames)
    }

    /// Finish the recording and return it as a single WAV blob.
    ///
    /// The microphone is released before encoding begins.
    pub fn stop(&mut self) -> Result<Recording, OneiricError> {
        let mut active = self
            .active
            .take()
            .ok_or_else(|| OneiricError::Audio("No recording in progress".into()))?;

        active.teardown();
        let samples = active.stream.drain();
        let sample_rate = active.stream.sample_rate();
        let duration = active.started_at.elapsed();
        drop(active);

        if samples.is_empty() {
            warn!("Recording stopped with no captured audio");
        }
        let bytes = encode_wav(&samples, sample_rate)?;
        debug!(
            samples = samples.len(),
            bytes = bytes.len(),
            duration_ms = duration.as_millis() as u64,
            "Recording finalised"
        );
        Ok(Recording::new(bytes, Some(WAV_MIME.to_string())))
    }

    /// Abandon the recording, discarding captured audio.
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            info!("Recording cancelled");
        }
    }
}
