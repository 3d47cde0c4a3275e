//! Frequency-domain amplitude sampling for the live visualiser.
//!
//! Produces one byte per frequency bin (`fft_size / 2` bins), scaled from a
//! decibel range onto 0..=255, the same shape a browser analyser node hands
//! to a bar visualiser.

use std::f32::consts::PI;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Windowed magnitude spectrum of the newest `fft_size` samples.
#[derive(Debug, Clone)]
pub struct FrequencyAnalyser {
    fft_size: usize,
    window: Vec<f32>,
    /// Precomputed `(cos, sin)` twiddles, `bins * fft_size` entries.
    twiddles: Vec<(f32, f32)>,
}

impl FrequencyAnalyser {
    /// `fft_size` is clamped up to at least 2.
    pub fn new(fft_size: usize) -> Self {
        let n = fft_size.max(2);
        let window = (0..n)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
            .collect();
        let bins = n / 2;
        let mut twiddles = Vec::with_capacity(bins * n);
        for k in 0..bins {
            for i in 0..n {
                let angle = 2.0 * PI * (k * i) as f32 / n as f32;
                twiddles.push((angle.cos(), angle.sin()));
            }
        }
        Self {
            fft_size: n,
            window,
            twiddles,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins per frame.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Byte-scaled amplitude per bin.
    ///
    /// `samples` shorter than the window are zero-padded at the front;
    /// longer input uses only its newest `fft_size` samples.
    pub fn byte_frequency_data(&self, samples: &[f32]) -> Vec<u8> {
        let n = self.fft_size;
        let start = samples.len().saturating_sub(n);
        let recent = &samples[start..];
        let pad = n - recent.len();

        (0..self.bin_count())
            .map(|k| {
                let row = &self.twiddles[k * n..(k + 1) * n];
                let (mut re, mut im) = (0.0f32, 0.0f32);
                for (j, &sample) in recent.iter().enumerate() {
                    let i = pad + j;
                    let v = sample * self.window[i];
                    re += v * row[i].0;
                    im -= v * row[i].1;
                }
                let magnitude = (re * re + im * im).sqrt() / n as f32;
                to_byte(magnitude)
            })
            .collect()
    }
}

fn to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 * (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    scaled.clamp(0.0, 255.0) as u8
}
