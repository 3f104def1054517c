//! Groq-compatible speech client
//!
//! Whisper transcription via multipart upload and OpenAI-style
//! `/audio/speech` synthesis. All failures are absorbed here per the
//! fail-soft contract of [`SpeechBridge`](crate::speech::SpeechBridge).

use crate::config::{
    SYNTHESIS_TIMEOUT, TRANSCRIPTION_TIMEOUT, TTS_MODEL, TTS_SPEED, TTS_VOICE, WHISPER_MODEL,
};
use crate::speech::{clean_for_speech, SpeechBridge};
use crate::{AriaError, Result};
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

pub struct GroqSpeech {
    http: reqwest::Client,
    runtime: Runtime,
    base_url: String,
    credential: String,
    voice: String,
    speed: f32,
}

impl GroqSpeech {
    pub fn new(base_url: impl Into<String>, credential: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::new();
        let runtime = Runtime::new()
            .map_err(|e| AriaError::ConfigError(format!("Runtime creation failed: {}", e)))?;

        Ok(Self {
            http,
            runtime,
            base_url: base_url.into(),
            credential: credential.into(),
            voice: TTS_VOICE.to_string(),
            speed: TTS_SPEED,
        })
    }

    /// Set the synthesis voice
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set the speech rate multiplier
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    async fn transcribe_inner(&self, credential: &str, audio: &[u8]) -> Result<String> {
        let part = Part::bytes(audio.to_vec())
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .map_err(|e| AriaError::TranscriptionError(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("model", WHISPER_MODEL)
            .text("response_format", "text");

        let resp = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(credential)
            .multipart(form)
            .timeout(TRANSCRIPTION_TIMEOUT)
            .send()
            .await
            .map_err(|e| AriaError::TranscriptionError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AriaError::TranscriptionError(format!(
                "status {}",
                resp.status().as_u16()
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| AriaError::TranscriptionError(e.to_string()))?;

        Ok(text.trim().to_string())
    }

    async fn synthesize_inner(&self, text: &str) -> Result<Vec<u8>> {
        let body = json!({
            "model": TTS_MODEL,
            "voice": self.voice,
            "input": text,
            "response_format": "mp3",
            "speed": self.speed,
        });

        let resp = self
            .http
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.credential)
            .json(&body)
            .timeout(SYNTHESIS_TIMEOUT)
            .send()
            .await
            .map_err(|e| AriaError::SynthesisError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AriaError::SynthesisError(format!(
                "status {}",
                resp.status().as_u16()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AriaError::SynthesisError(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

impl SpeechBridge for GroqSpeech {
    fn transcribe(&self, credential: &str, audio: &[u8]) -> String {
        if credential.trim().is_empty() {
            return String::new();
        }

        match self
            .runtime
            .block_on(self.transcribe_inner(credential, audio))
        {
            Ok(text) => text,
            Err(e) => format!("[Transcription error: {}]", e),
        }
    }

    fn synthesize(&self, text: &str) -> Vec<u8> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let clean = clean_for_speech(text);
        if clean.is_empty() {
            return Vec::new();
        }

        match self.runtime.block_on(self.synthesize_inner(&clean)) {
            Ok(bytes) => {
                debug!("synthesized {} bytes", bytes.len());
                bytes
            }
            Err(e) => {
                warn!("synthesis failed: {}", e);
                Vec::new()
            }
        }
    }
}
