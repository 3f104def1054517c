//! Capture buffering and encoding
//!
//! Front-ends hand over microphone audio either as raw f32 frames
//! (accumulated in a [`CaptureBuffer`] and encoded to 16-bit WAV for
//! upload) or as an already-encoded [`CapturedAudio`] payload carrying
//! base64 WAV bytes and a capture timestamp used for deduplication.

use crate::{AriaError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Root-mean-square level of one audio frame
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Synthesized reply audio handed to a front-end for playback
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpokenAudio {
    /// Base64-encoded audio bytes
    pub tts_audio: String,
}

impl SpokenAudio {
    pub fn from_bytes(audio: &[u8]) -> Self {
        Self {
            tts_audio: base64::engine::general_purpose::STANDARD.encode(audio),
        }
    }
}

/// An encoded capture delivered by a front-end.
///
/// Wire shape is `{captured_audio, timestamp}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapturedAudio {
    /// Base64-encoded WAV bytes
    #[serde(rename = "captured_audio")]
    pub audio_b64: String,
    /// Capture timestamp in milliseconds, used to drop duplicate
    /// deliveries of the same recording
    #[serde(rename = "timestamp")]
    pub captured_at: u64,
}

impl CapturedAudio {
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.audio_b64)
            .map_err(|e| AriaError::TranscriptionError(format!("bad audio payload: {}", e)))
    }
}

/// Accumulates raw f32 frames while the mic is open
pub struct CaptureBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl CaptureBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    pub fn push_frame(&mut self, frame: &[f32]) {
        self.samples.extend_from_slice(frame);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Drain the buffer into a mono 16-bit WAV suitable for upload
    pub fn take_wav(&mut self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| AriaError::TranscriptionError(e.to_string()))?;
            for sample in self.samples.drain(..) {
                let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(scaled)
                    .map_err(|e| AriaError::TranscriptionError(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| AriaError::TranscriptionError(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_silence_is_zero() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rms_constant_signal() {
        let level = rms(&[0.5, -0.5, 0.5, -0.5]);
        assert!((level - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_capture_buffer_round_trip() {
        let mut buf = CaptureBuffer::new(16_000);
        buf.push_frame(&[0.0, 0.25, -0.25, 1.0]);
        assert_eq!(buf.len(), 4);

        let wav = buf.take_wav().unwrap();
        assert!(buf.is_empty());
        assert_eq!(&wav[0..4], b"RIFF");

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn test_captured_audio_wire_shape() {
        let json = r#"{"captured_audio":"UklGRg==","timestamp":1000}"#;
        let capture: CapturedAudio = serde_json::from_str(json).unwrap();
        assert_eq!(capture.captured_at, 1000);
        assert_eq!(capture.decode().unwrap(), b"RIFF");

        let round = serde_json::to_value(&capture).unwrap();
        assert!(round.get("captured_audio").is_some());
        assert!(round.get("timestamp").is_some());
        assert!(round.get("audio_b64").is_none());
    }

    #[test]
    fn test_spoken_audio_encodes() {
        let payload = SpokenAudio::from_bytes(b"mp3bytes");
        assert_eq!(
            base64::engine::general_purpose::STANDARD
                .decode(&payload.tts_audio)
                .unwrap(),
            b"mp3bytes"
        );
    }

    #[test]
    fn test_captured_audio_decode() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"RIFFdata");
        let capture = CapturedAudio {
            audio_b64: encoded,
            captured_at: 1_725_000_000_000,
        };
        assert_eq!(capture.decode().unwrap(), b"RIFFdata");

        let bad = CapturedAudio {
            audio_b64: "not base64!!".to_string(),
            captured_at: 0,
        };
        assert!(bad.decode().is_err());
    }
}
