//! SpeechBridge: the seam over the opaque STT/TTS services
//!
//! Both directions fail soft. Transcription returns an empty or
//! error-tagged string, synthesis returns empty bytes; neither ever
//! raises past this boundary, so a speech outage degrades to text.

pub mod client;
pub mod sanitize;

pub use client::GroqSpeech;
pub use sanitize::clean_for_speech;

/// Prefix tagging a failed transcription result
pub const TRANSCRIPTION_ERROR_TAG: &str = "[Transcription error";

/// Speech-to-text and text-to-speech access
pub trait SpeechBridge: Send + Sync {
    /// Convert captured audio to text. Returns an empty string when no
    /// credential is configured, or an error-tagged string on failure.
    fn transcribe(&self, credential: &str, audio: &[u8]) -> String;

    /// Convert assistant text to playable audio. Returns empty bytes on
    /// any internal failure.
    fn synthesize(&self, text: &str) -> Vec<u8>;
}

/// Whether a transcription result should be submitted as a user turn
pub fn is_transcription_usable(text: &str) -> bool {
    !text.trim().is_empty() && !text.starts_with(TRANSCRIPTION_ERROR_TAG)
}

/// Speech bridge that produces nothing, for text-only operation
pub struct NullSpeech;

impl SpeechBridge for NullSpeech {
    fn transcribe(&self, _credential: &str, _audio: &[u8]) -> String {
        String::new()
    }

    fn synthesize(&self, _text: &str) -> Vec<u8> {
        Vec::new()
    }
}
