//! Sample conversion and container encoding.

use std::io::Cursor;

use oneiric_core::error::OneiricError;

/// MIME type of recordings produced from PCM microphones.
pub const WAV_MIME: &str = "audio/wav";

/// Average interleaved frames down to mono.
pub fn downmix_to_mono(data: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    let ch = channels as usize;
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Linear-interpolation resampling.
pub fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() || to_rate == 0 {
        return input.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (input.len() as f64 / ratio).ceil() as usize;
    let last = input.len() - 1;
    (0..out_len)
        .map(|i| {
            let src = i as f64 * ratio;
            let idx0 = (src.floor() as usize).min(last);
            let idx1 = (idx0 + 1).min(last);
            let frac = (src - idx0 as f64) as f32;
            input[idx0] * (1.0 - frac) + input[idx1] * frac
        })
        .collect()
}

/// Encode mono f32 samples as a 16-bit PCM WAV file in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, OneiricError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| OneiricError::Audio(format!("Failed to create WAV writer: {}", e)))?;
    for &sample in samples {
        let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(value)
            .map_err(|e| OneiricError::Audio(format!("Failed to write sample: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| OneiricError::Audio(format!("Failed to finalize WAV: {}", e)))?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_to_mono_downmix() {
        let stereo = vec![0.4f32, 0.6, 0.2, 0.8, 1.0, 0.0];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 3);
        for s in mono {
            assert!((s - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mono_passthrough() {
        assert_eq!(downmix_to_mono(&[0.1, 0.2], 1), vec![0.1, 0.2]);
    }

    #[test]
    fn test_linear_resample_3to1() {
        let input: Vec<f32> = (0..30).map(|i| i as f32).collect();
        let out = resample_linear(&input, 48000, 16000);
        assert_eq!(out.len(), 10);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 3.0).abs() < 1e-6);
        assert!((out[9] - 27.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        assert_eq!(resample_linear(&[1.0, 2.0], 16000, 16000), vec![1.0, 2.0]);
        assert!(resample_linear(&[], 48000, 16000).is_empty());
    }

    #[test]
    fn test_encode_wav_roundtrips_through_reader() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0];
        let bytes = encode_wav(&samples, 16000).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn test_encode_wav_clamps_out_of_range() {
        let bytes = encode_wav(&[4.0, -4.0], 8000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![32767, -32768]);
    }
}
