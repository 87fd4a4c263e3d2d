//! PCM16 audio codec for the realtime protocol.
//!
//! Audio travels as base64 of little-endian signed 16-bit mono samples at
//! 24 kHz. Float samples in [-1, 1] map to i16 with negatives scaled by
//! 0x8000 and positives by 0x7FFF, so both ends of the range are reachable.

use base64::Engine as _;
use thiserror::Error;

pub const SAMPLE_RATE_HZ: u32 = 24_000;
pub const FRAME_SAMPLES: usize = 4096;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("invalid base64 audio: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PCM16 payload has odd length {0}")]
    OddLength(usize),
}

fn to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

fn to_f32(sample: i16) -> f32 {
    if sample < 0 {
        sample as f32 / 32768.0
    } else {
        sample as f32 / 32767.0
    }
}

pub fn float_to_pcm16(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| to_i16(s).to_le_bytes())
        .collect()
}

pub fn pcm16_to_float(bytes: &[u8]) -> Result<Vec<f32>, AudioError> {
    if bytes.len() % 2 != 0 {
        return Err(AudioError::OddLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| to_f32(i16::from_le_bytes([pair[0], pair[1]])))
        .collect())
}

/// Encodes one capture frame as the `audio` field of
/// `input_audio_buffer.append`.
pub fn encode_audio(samples: &[f32]) -> String {
    base64::engine::general_purpose::STANDARD.encode(float_to_pcm16(samples))
}

fn decode_pcm16(encoded: &str) -> Result<Vec<u8>, AudioError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    if bytes.len() % 2 != 0 {
        return Err(AudioError::OddLength(bytes.len()));
    }
    Ok(bytes)
}

/// Number of samples in a base64 PCM16 payload such as the `delta` of a
/// `response.audio.delta` event. Samples are counted, not converted.
pub fn pcm16_sample_count(encoded: &str) -> Result<usize, AudioError> {
    Ok(decode_pcm16(encoded)?.len() / 2)
}

pub fn duration_ms(sample_count: usize) -> u64 {
    (sample_count as u64 * 1000) / SAMPLE_RATE_HZ as u64
}

/// Splits a stream of captured samples into fixed-size frames.
#[derive(Debug)]
pub struct FrameChunker {
    frame_size: usize,
    pending: Vec<f32>,
}

impl Default for FrameChunker {
    fn default() -> Self {
        Self::new(FRAME_SAMPLES)
    }
}

impl FrameChunker {
    pub fn new(frame_size: usize) -> Self {
        let frame_size = frame_size.max(1);
        Self {
            frame_size,
            pending: Vec::with_capacity(frame_size),
        }
    }

    /// Buffers `samples` and returns every frame that is now full.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.pending.extend_from_slice(samples);
        let full = self.pending.len() / self.frame_size * self.frame_size;
        if full == 0 {
            return Vec::new();
        }
        let rest = self.pending.split_off(full);
        let frames = self
            .pending
            .chunks(self.frame_size)
            .map(<[f32]>::to_vec)
            .collect();
        self.pending = rest;
        frames
    }

    /// Returns the trailing partial frame, if any.
    pub fn flush(&mut self) -> Option<Vec<f32>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes_and_clamping() {
        let bytes = float_to_pcm16(&[-1.0, 1.0, 0.0, -3.0, 2.5, f32::NAN]);
        let values: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|p| i16::from_le_bytes([p[0], p[1]]))
            .collect();
        assert_eq!(values, vec![i16::MIN, i16::MAX, 0, i16::MIN, i16::MAX, 0]);
    }

    #[test]
    fn test_little_endian_layout() {
        // 0x7FFF -> [0xFF, 0x7F]
        assert_eq!(float_to_pcm16(&[1.0]), vec![0xFF, 0x7F]);
        assert_eq!(float_to_pcm16(&[-1.0]), vec![0x00, 0x80]);
    }

    #[test]
    fn test_decode_restores_samples_within_quantization() {
        let input = [0.25f32, -0.5, 0.999, -0.001];
        let decoded = pcm16_to_float(&decode_pcm16(&encode_audio(&input)).unwrap()).unwrap();
        assert_eq!(decoded.len(), input.len());
        for (a, b) in input.iter().zip(decoded) {
            assert!((a - b).abs() < 1.0 / 16384.0, "{a} vs {b}");
        }
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(pcm16_sample_count(&encode_audio(&[0.0; 480])).unwrap(), 480);
        assert_eq!(pcm16_sample_count("").unwrap(), 0);
        assert!(matches!(pcm16_sample_count("!!!not base64"), Err(AudioError::Base64(_))));
        // "AQID" is three bytes
        assert!(matches!(pcm16_sample_count("AQID"), Err(AudioError::OddLength(3))));
    }

    #[test]
    fn test_duration_at_24khz() {
        assert_eq!(duration_ms(24_000), 1000);
        assert_eq!(duration_ms(FRAME_SAMPLES), 170);
        assert_eq!(duration_ms(0), 0);
    }

    #[test]
    fn test_chunker_emits_fixed_frames() {
        let mut chunker = FrameChunker::new(4);
        assert!(chunker.push(&[0.1, 0.2, 0.3]).is_empty());
        let frames = chunker.push(&[0.4, 0.5, 0.6, 0.7, 0.8, 0.9]);
        assert_eq!(frames, vec![vec![0.1, 0.2, 0.3, 0.4], vec![0.5, 0.6, 0.7, 0.8]]);
        assert_eq!(chunker.flush(), Some(vec![0.9]));
        assert_eq!(chunker.flush(), None);
    }

    #[test]
    fn test_default_chunker_uses_frame_size() {
        let mut chunker = FrameChunker::default();
        let frames = chunker.push(&vec![0.0; FRAME_SAMPLES * 2 + 10]);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.len() == FRAME_SAMPLES));
        assert_eq!(chunker.flush().map(|f| f.len()), Some(10));
    }
}
