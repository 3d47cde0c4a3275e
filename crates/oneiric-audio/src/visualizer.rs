//! Live spectrum visualiser task.
//!
//! An independent tokio task samples the microphone tap at a fixed frame
//! rate and publishes byte spectra on a `watch` channel. It only reads
//! samples, so a slow or absent consumer never delays recording. The task
//! lives exactly as long as its [`VisualizerGuard`].

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::analyser::FrequencyAnalyser;
use crate::buffer::SampleBuffer;

/// One spectrum frame: a byte amplitude per frequency bin.
pub type SpectrumFrame = Vec<u8>;

/// Owns the visualiser task; stopping or dropping it tears the task down.
#[derive(Debug)]
pub struct VisualizerGuard {
    handle: Option<JoinHandle<()>>,
}

impl VisualizerGuard {
    /// Abort the sampling task. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Visualizer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for VisualizerGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns visualiser tasks.
pub struct Visualizer;

impl Visualizer {
    /// Start sampling `tap` at `fps` frames per second.
    ///
    /// Must be called from within a tokio runtime. Returns the guard that
    /// owns the task and a receiver for the newest frame.
    pub fn spawn(
        tap: SampleBuffer,
        analyser: FrequencyAnalyser,
        fps: u32,
    ) -> (VisualizerGuard, watch::Receiver<SpectrumFrame>) {
        let (tx, rx) = watch::channel(vec![0u8; analyser.bin_count()]);
        // Past 1000 fps the millisecond period would round down to zero.
        let period = Duration::from_millis((1000 / u64::from(fps.max(1))).max(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let samples = tap.latest(analyser.fft_size());
                let frame = analyser.byte_frequency_data(&samples);
                if tx.send(frame).is_err() {
                    // Every receiver is gone; nothing left to draw.
                    break;
                }
            }
        });

        tracing::debug!(fps, "Visualizer started");
        (
            VisualizerGuard {
                handle: Some(handle),
            },
            rx,
        )
    }
}
