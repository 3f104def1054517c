//! Hands-free turn taking as a pure state machine
//!
//! No audio device or clock is owned here. The host feeds playback
//! events, per-frame RMS levels and elapsed time; the machine answers
//! with state transitions. Gating rules:
//!   - the mic only opens after playback plus a settle delay
//!   - a capture commits after sustained silence, and only if enough
//!     speech was heard first
//!   - short blips are discarded and listening resumes

use crate::config::{MIC_DELAY, MIN_SPEECH_DURATION, SILENCE_DURATION, SILENCE_THRESHOLD};
use crate::voice::VoiceLoopState;
use std::time::Duration;
use tracing::debug;

/// Tunable thresholds for the hands-free loop
#[derive(Clone, Copy, Debug)]
pub struct VoiceConfig {
    /// RMS below this counts as silence
    pub silence_threshold: f32,
    /// Continuous silence that ends a capture
    pub silence_duration: Duration,
    /// Settle delay between playback ending and the mic opening
    pub mic_delay: Duration,
    /// Minimum heard speech for a capture to commit
    pub min_speech_duration: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            silence_threshold: SILENCE_THRESHOLD,
            silence_duration: SILENCE_DURATION,
            mic_delay: MIC_DELAY,
            min_speech_duration: MIN_SPEECH_DURATION,
        }
    }
}

/// What the host should do after feeding one audio frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Keep capturing
    Continue,
    /// Silence closed the phrase; send the capture for transcription
    Commit,
    /// Too little speech was heard; the capture was dropped and
    /// listening restarted
    Discard,
}

pub struct VoiceLoop {
    config: VoiceConfig,
    state: VoiceLoopState,
    enabled: bool,
    settle_remaining: Option<Duration>,
    speech_time: Duration,
    silence_time: Duration,
}

impl VoiceLoop {
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            config,
            state: VoiceLoopState::Idle,
            enabled: false,
            settle_remaining: None,
            speech_time: Duration::ZERO,
            silence_time: Duration::ZERO,
        }
    }

    pub fn state(&self) -> VoiceLoopState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn the hands-free loop on. The mic opens right away when
    /// nothing is playing.
    pub fn enable(&mut self) {
        self.enabled = true;
        if self.state.is_idle() {
            self.begin_listening();
        }
    }

    /// Turn the hands-free loop off. Takes effect at the next idle
    /// transition; a capture or transcription in flight runs to
    /// completion first.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Assistant audio is about to play
    pub fn on_playback_queued(&mut self) {
        if !self.enabled {
            return;
        }
        self.reset_counters();
        self.settle_remaining = None;
        self.state = VoiceLoopState::Speaking;
    }

    /// Assistant audio finished; the settle timer starts
    pub fn on_playback_done(&mut self) {
        if self.state.is_speaking() {
            self.settle_remaining = Some(self.config.mic_delay);
        }
    }

    /// Advance internal timers by `dt`. Drives the settle delay that
    /// separates playback from listening.
    pub fn advance(&mut self, dt: Duration) {
        if let Some(remaining) = self.settle_remaining {
            if remaining <= dt {
                self.settle_remaining = None;
                if self.enabled {
                    self.begin_listening();
                } else {
                    self.state = VoiceLoopState::Idle;
                }
            } else {
                self.settle_remaining = Some(remaining - dt);
            }
        }
    }

    /// Feed one captured frame's RMS level and its duration
    pub fn on_audio_frame(&mut self, rms: f32, dt: Duration) -> FrameOutcome {
        if !self.state.is_listening() {
            return FrameOutcome::Continue;
        }

        if rms < self.config.silence_threshold {
            self.silence_time += dt;
        } else {
            self.speech_time += dt;
            self.silence_time = Duration::ZERO;
        }

        if self.silence_time >= self.config.silence_duration {
            if self.speech_time >= self.config.min_speech_duration {
                debug!(speech_ms = self.speech_time.as_millis() as u64, "capture committed");
                self.reset_counters();
                self.state = VoiceLoopState::Transcribing;
                return FrameOutcome::Commit;
            }
            // Not enough speech; drop the buffer and listen again
            self.reset_counters();
            if !self.enabled {
                self.state = VoiceLoopState::Idle;
            }
            return FrameOutcome::Discard;
        }

        FrameOutcome::Continue
    }

    /// A transcription came back usable; the loop idles until the
    /// assistant reply is queued for playback.
    pub fn on_transcribed(&mut self) {
        if self.state.is_transcribing() {
            self.state = VoiceLoopState::Idle;
        }
    }

    /// A reply finalized with no playable audio; reopen the mic so the
    /// hands-free cycle keeps going without a playback event.
    pub fn on_reply_without_audio(&mut self) {
        if self.enabled && self.state.is_idle() {
            self.begin_listening();
        }
    }

    /// A transcription came back empty or failed; reopen the mic
    pub fn on_transcription_unusable(&mut self) {
        if self.state.is_transcribing() {
            if self.enabled {
                self.begin_listening();
            } else {
                self.state = VoiceLoopState::Idle;
            }
        }
    }

    fn begin_listening(&mut self) {
        self.reset_counters();
        self.state = VoiceLoopState::Listening;
    }

    fn reset_counters(&mut self) {
        self.speech_time = Duration::ZERO;
        self.silence_time = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(100);

    fn loud() -> f32 {
        0.2
    }

    fn quiet() -> f32 {
        0.001
    }

    fn listening_loop() -> VoiceLoop {
        let mut vl = VoiceLoop::new(VoiceConfig::default());
        vl.enable();
        vl
    }

    #[test]
    fn test_enable_opens_mic_when_idle() {
        let vl = listening_loop();
        assert!(vl.state().is_listening());
    }

    #[test]
    fn test_playback_then_settle_then_listening() {
        let mut vl = listening_loop();
        vl.on_playback_queued();
        assert!(vl.state().is_speaking());

        vl.on_playback_done();
        vl.advance(Duration::from_millis(100));
        assert!(vl.state().is_speaking());

        vl.advance(Duration::from_millis(250));
        assert!(vl.state().is_listening());
    }

    #[test]
    fn test_sustained_silence_commits_capture() {
        let mut vl = listening_loop();

        // 600ms of speech, then 1.5s of silence
        for _ in 0..6 {
            assert_eq!(vl.on_audio_frame(loud(), FRAME), FrameOutcome::Continue);
        }
        for _ in 0..14 {
            assert_eq!(vl.on_audio_frame(quiet(), FRAME), FrameOutcome::Continue);
        }
        assert_eq!(vl.on_audio_frame(quiet(), FRAME), FrameOutcome::Commit);
        assert!(vl.state().is_transcribing());
    }

    #[test]
    fn test_short_blip_is_discarded() {
        let mut vl = listening_loop();

        // 200ms of speech is under the minimum
        vl.on_audio_frame(loud(), FRAME);
        vl.on_audio_frame(loud(), FRAME);
        for _ in 0..14 {
            vl.on_audio_frame(quiet(), FRAME);
        }
        assert_eq!(vl.on_audio_frame(quiet(), FRAME), FrameOutcome::Discard);
        assert!(vl.state().is_listening());
    }

    #[test]
    fn test_speech_resets_silence_counter() {
        let mut vl = listening_loop();

        for _ in 0..6 {
            vl.on_audio_frame(loud(), FRAME);
        }
        for _ in 0..10 {
            vl.on_audio_frame(quiet(), FRAME);
        }
        // A new word arrives before the silence window closes
        vl.on_audio_frame(loud(), FRAME);
        for _ in 0..10 {
            assert_eq!(vl.on_audio_frame(quiet(), FRAME), FrameOutcome::Continue);
        }
        assert!(vl.state().is_listening());
    }

    #[test]
    fn test_empty_transcription_reopens_mic() {
        let mut vl = listening_loop();
        for _ in 0..6 {
            vl.on_audio_frame(loud(), FRAME);
        }
        for _ in 0..16 {
            vl.on_audio_frame(quiet(), FRAME);
        }
        assert!(vl.state().is_transcribing());

        vl.on_transcription_unusable();
        assert!(vl.state().is_listening());
    }

    #[test]
    fn test_disable_lets_listening_cycle_finish() {
        let mut vl = listening_loop();
        for _ in 0..6 {
            vl.on_audio_frame(loud(), FRAME);
        }

        // Disabling mid-capture must not cut the cycle short
        vl.disable();
        assert!(vl.state().is_listening());

        for _ in 0..14 {
            assert_eq!(vl.on_audio_frame(quiet(), FRAME), FrameOutcome::Continue);
        }
        assert_eq!(vl.on_audio_frame(quiet(), FRAME), FrameOutcome::Commit);
        assert!(vl.state().is_transcribing());

        vl.on_transcribed();
        assert!(vl.state().is_idle());
        vl.on_reply_without_audio();
        assert!(vl.state().is_idle());
    }

    #[test]
    fn test_disable_applies_when_blip_discarded() {
        let mut vl = listening_loop();
        vl.on_audio_frame(loud(), FRAME);
        vl.disable();

        for _ in 0..14 {
            vl.on_audio_frame(quiet(), FRAME);
        }
        assert_eq!(vl.on_audio_frame(quiet(), FRAME), FrameOutcome::Discard);
        assert!(vl.state().is_idle());
    }

    #[test]
    fn test_reply_without_audio_reopens_mic() {
        let mut vl = listening_loop();
        for _ in 0..6 {
            vl.on_audio_frame(loud(), FRAME);
        }
        for _ in 0..15 {
            vl.on_audio_frame(quiet(), FRAME);
        }
        assert!(vl.state().is_transcribing());

        vl.on_transcribed();
        assert!(vl.state().is_idle());

        // The reply produced no audio, so no playback event will come
        vl.on_reply_without_audio();
        assert!(vl.state().is_listening());
    }

    #[test]
    fn test_disable_lets_transcription_finish() {
        let mut vl = listening_loop();
        for _ in 0..6 {
            vl.on_audio_frame(loud(), FRAME);
        }
        for _ in 0..16 {
            vl.on_audio_frame(quiet(), FRAME);
        }
        assert!(vl.state().is_transcribing());

        vl.disable();
        assert!(vl.state().is_transcribing());
        vl.on_transcribed();
        assert!(vl.state().is_idle());
    }

    #[test]
    fn test_settle_while_disabled_ends_idle() {
        let mut vl = listening_loop();
        vl.on_playback_queued();
        vl.on_playback_done();
        vl.disable();
        vl.advance(Duration::from_secs(1));
        assert!(vl.state().is_idle());
    }
}
