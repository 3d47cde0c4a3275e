//! Real microphone capture via cpal.
//!
//! Captures the configured input device, downmixes to mono and resamples to
//! the configured rate inside the callback. Dropping the cpal stream stops
//! the device, so releasing tracks is just dropping it.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info};

use oneiric_core::config::AudioConfig;
use oneiric_core::error::OneiricError;

use crate::buffer::SampleBuffer;
use crate::convert::{downmix_to_mono, resample_linear};
use crate::{Microphone, MicrophoneStream};

/// Samples kept for the visualiser tap.
const TAP_SAMPLES: usize = 8192;

/// `cpal::Stream` carries a `*mut ()` marker that prevents auto `Send`.
struct SendStream(#[allow(dead_code)] cpal::Stream);

// SAFETY: the handle is only stored and dropped, never used to touch audio
// data; callbacks run on cpal's own thread and share state only through
// `SampleBuffer`'s mutex.
unsafe impl Send for SendStream {}

/// Microphone backed by the default cpal host.
#[derive(Debug, Clone)]
pub struct CpalMicrophone {
    config: AudioConfig,
}

impl CpalMicrophone {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    fn find_device(&self) -> Result<cpal::Device, OneiricError> {
        let host = cpal::default_host();
        if self.config.device_name == "default" {
            return host
                .default_input_device()
                .ok_or_else(|| OneiricError::Microphone("No default input device found".into()));
        }

        let wanted = self.config.device_name.to_lowercase();
        host.input_devices()
            .map_err(|e| OneiricError::Microphone(format!("Failed to enumerate devices: {}", e)))?
            .find(|d| {
                d.name()
                    .map(|n| n.to_lowercase().contains(&wanted))
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                OneiricError::Microphone(format!(
                    "Audio device '{}' not found",
                    self.config.device_name
                ))
            })
    }

    fn open_blocking(&self) -> Result<CpalStream, OneiricError> {
        let device = self.find_device()?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device.default_input_config().map_err(|e| {
            OneiricError::Microphone(format!("No usable input config on '{}': {}", device_name, e))
        })?;
        let device_rate = supported.sample_rate().0;
        let device_channels = supported.channels();
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();

        let target_rate = self.config.sample_rate;
        let max_samples =
            target_rate as usize * (self.config.max_recording_secs.max(1) as usize + 1);
        let recorded = SampleBuffer::new(max_samples);
        let tap = SampleBuffer::new(TAP_SAMPLES);

        let sink = {
            let recorded = recorded.clone();
            let tap = tap.clone();
            move |data: &[f32]| {
                let mono = downmix_to_mono(data, device_channels);
                let converted = resample_linear(&mono, device_rate, target_rate);
                recorded.push(&converted);
                tap.push(&converted);
            }
        };
        let on_error = |err: cpal::StreamError| tracing::error!("Microphone stream error: {}", err);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| sink(data),
                on_error,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> =
                        data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                    sink(&floats)
                },
                on_error,
                None,
            ),
            other => {
                return Err(OneiricError::Microphone(format!(
                    "Unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| OneiricError::Microphone(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| OneiricError::Microphone(format!("Failed to start input stream: {}", e)))?;

        if device_rate != target_rate || device_channels != 1 {
            debug!(
                device_rate,
                device_channels, target_rate, "Capture will downmix/resample"
            );
        }
        info!(device = %device_name, target_rate, "Microphone opened");

        Ok(CpalStream {
            stream: Some(SendStream(stream)),
            sample_rate: target_rate,
            recorded,
            tap,
        })
    }
}

impl Microphone for CpalMicrophone {
    async fn open(&self) -> Result<Box<dyn MicrophoneStream>, OneiricError> {
        let stream = self.open_blocking()?;
        Ok(Box::new(stream))
    }
}

struct CpalStream {
    stream: Option<SendStream>,
    sample_rate: u32,
    recorded: SampleBuffer,
    tap: SampleBuffer,
}

impl MicrophoneStream for CpalStream {
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
        if self.stream.take().is_some() {
            info!("Microphone released");
        }
    }

    fn is_live(&self) -> bool {
        self.stream.is_some()
    }
}
