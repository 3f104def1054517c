//! Central configuration for the Aria CRM voice assistant
//!
//! All tunable constants live here so no magic numbers leak into other
//! modules.

use crate::voice::VoiceConfig;
use std::time::Duration;

// ── Completion service (Groq, OpenAI-compatible) ────────────────────────────

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const MAX_TOKENS: u32 = 256;
pub const TEMPERATURE: f32 = 0.65;

/// Display label / model id pairs offered to front-ends
pub const MODEL_OPTIONS: &[(&str, &str)] = &[
    ("Llama 3.3 70B (Best)", "llama-3.3-70b-versatile"),
    ("Llama 3.1 8B (Fastest)", "llama-3.1-8b-instant"),
    ("Mixtral 8x7B", "mixtral-8x7b-32768"),
    ("Gemma 2 9B", "gemma2-9b-it"),
];

/// Hard bound on a single streaming completion call
pub const STREAM_TIMEOUT: Duration = Duration::from_secs(60);

// ── Speech ──────────────────────────────────────────────────────────────────

pub const WHISPER_MODEL: &str = "whisper-large-v3";

pub const TTS_MODEL: &str = "playai-tts";

/// Voice name passed through to the speech endpoint
pub const TTS_VOICE: &str = "en-US-AriaNeural";

/// 1.3x speed, matching a "+30%" spoken rate
pub const TTS_SPEED: f32 = 1.3;

/// Synthesis input is truncated to this many characters
pub const TTS_MAX_CHARS: usize = 3000;

/// Hard bound on a single synthesis call
pub const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard bound on a single transcription call
pub const TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(30);

// ── Storage ─────────────────────────────────────────────────────────────────

/// Hard bound on a single storage round-trip
pub const STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

// ── Voice loop ──────────────────────────────────────────────────────────────

/// RMS below this counts as silence
pub const SILENCE_THRESHOLD: f32 = 0.015;

/// Continuous silence required before auto-stop
pub const SILENCE_DURATION: Duration = Duration::from_millis(1500);

/// Settle delay after playback before the mic activates
pub const MIC_DELAY: Duration = Duration::from_millis(300);

/// Minimum captured speech before a capture is processed
pub const MIN_SPEECH_DURATION: Duration = Duration::from_millis(500);

/// Assistant-wide configuration
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// API credential for the completion and speech services
    pub credential: String,

    /// Model id for completions
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Voice name for synthesis
    pub tts_voice: String,

    /// Speech rate multiplier for synthesis
    pub tts_speed: f32,

    /// Voice loop thresholds
    pub voice: VoiceConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            credential: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GROQ_BASE_URL.to_string(),
            tts_voice: TTS_VOICE.to_string(),
            tts_speed: TTS_SPEED,
            voice: VoiceConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Set the API credential
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    /// Set the completion model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the synthesis voice
    pub fn with_tts_voice(mut self, voice: impl Into<String>) -> Self {
        self.tts_voice = voice.into();
        self
    }

    /// Set the voice loop thresholds
    pub fn with_voice(mut self, voice: VoiceConfig) -> Self {
        self.voice = voice;
        self
    }

    /// Whether a credential is configured
    pub fn has_credential(&self) -> bool {
        !self.credential.trim().is_empty()
    }
}
