//! Oneiric Audio crate - microphone capture, recording and live spectrum.
//!
//! Provides a trait-based microphone abstraction, the [`Recorder`] that owns
//! a capture stream for the length of one voice message, WAV encoding, and
//! the frequency analyser that drives the terminal visualiser. Includes a
//! mock microphone for testing without audio hardware.

pub mod analyser;
pub mod buffer;
pub mod convert;
#[cfg(feature = "cpal")]
pub mod cpal_mic;
pub mod recorder;
pub mod visualizer;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use oneiric_core::error::OneiricError;

pub use analyser::FrequencyAnalyser;
pub use buffer::SampleBuffer;
#[cfg(feature = "cpal")]
pub use cpal_mic::CpalMicrophone;
pub use recorder::Recorder;
pub use visualizer::{SpectrumFrame, Visualizer, VisualizerGuard};

// =============================================================================
// Traits
// =============================================================================

/// Source of live microphone streams.
pub trait Microphone: Send + Sync {
    /// Acquire the device and start capturing.
    ///
    /// Denied permission or a missing device yields
    /// `OneiricError::Microphone`; nothing is left running on failure.
    fn open(&self) -> impl Future<Output = Result<Box<dyn MicrophoneStream>, OneiricError>> + Send;
}

/// A running capture stream with exclusive use of the device.
///
/// Samples are mono f32 at [`sample_rate`](Self::sample_rate).
pub trait MicrophoneStream: Send {
    fn sample_rate(&self) -> u32;

    /// Drain every sample captured since the last call.
    fn drain(&mut self) -> Vec<f32>;

    /// Read-only view of the newest samples for the visualiser.
    fn analyser_source(&self) -> SampleBuffer;

    /// Stop every track and release the device. Idempotent.
    fn stop_tracks(&mut self);

    fn is_live(&self) -> bool;
}

// =============================================================================
// Mock implementation
// =============================================================================

#[derive(Debug, Default)]
struct MockScript {
    chunks: Vec<Vec<f32>>,
    failure: Option<String>,
}

/// Mock microphone for testing.
///
/// Every opened stream replays the scripted chunks. Open and live-stream
/// counters are shared across clones so tests can observe that the device
/// is released.
#[derive(Debug, Clone)]
pub struct MockMicrophone {
    sample_rate: u32,
    script: Arc<Mutex<MockScript>>,
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl Default for MockMicrophone {
    fn default() -> Self {
        Self::new(16000)
    }
}

impl MockMicrophone {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            script: Arc::new(Mutex::new(MockScript::default())),
            opened: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Append one chunk of samples delivered by every subsequent stream.
    pub fn push_chunk(&self, samples: Vec<f32>) {
        self.script
            .lock()
            .expect("mock microphone mutex poisoned")
            .chunks
            .push(samples);
    }

    /// Make every subsequent `open` fail as if permission were denied.
    pub fn fail_with(&self, reason: &str) {
        self.script
            .lock()
            .expect("mock microphone mutex poisoned")
            .failure = Some(reason.to_string());
    }

    /// Number of successful `open` calls.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of streams that have not released their tracks.
    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Microphone for MockMicrophone {
    async fn open(&self) -> Result<Box<dyn MicrophoneStream>, OneiricError> {
        let chunks = {
            let script = self.script.lock().expect("mock microphone mutex poisoned");
            if let Some(reason) = &script.failure {
                return Err(OneiricError::Microphone(reason.clone()));
            }
            script.chunks.clone()
        };

        let total: usize = chunks.iter().map(Vec::len).sum();
        let recorded = SampleBuffer::new(total.max(1));
        let tap = SampleBuffer::new(total.max(1));
        for chunk in &chunks {
            recorded.push(chunk);
            tap.push(chunk);
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Mock microphone opened");

        Ok(Box::new(MockStream {
            sample_rate: self.sample_rate,
            recorded,
            tap,
            live: AtomicBool::new(true),
            live_count: Arc::clone(&self.live),
        }))
    }
}

struct MockStream {
    sample_rate: u32,
    recorded: SampleBuffer,
    tap: SampleBuffer,
    live: AtomicBool,
    live_count: Arc<AtomicUsize>,
}

impl MicrophoneStream for MockStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain(&mut self) -> Vec<f32> {
        self.recorded.take()
    }

    fn analyser_source(&self) -> SampleBuffer {
        self.tap.clone()
    }

    fn stop_tracks(&mut self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.live_count.fetch_sub(1, Ordering::SeqCst);
            tracing::info!("Mock microphone released");
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}
