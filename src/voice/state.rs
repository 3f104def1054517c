//! Voice loop states

use std::fmt;

/// Where the hands-free loop currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceLoopState {
    /// Not capturing and nothing playing
    Idle,
    /// Assistant audio is playing (or settling after playback)
    Speaking,
    /// Microphone is live, waiting for the user to finish a phrase
    Listening,
    /// A capture is out for transcription
    Transcribing,
}

impl VoiceLoopState {
    pub fn is_idle(&self) -> bool {
        matches!(self, VoiceLoopState::Idle)
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, VoiceLoopState::Speaking)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, VoiceLoopState::Listening)
    }

    pub fn is_transcribing(&self) -> bool {
        matches!(self, VoiceLoopState::Transcribing)
    }
}

impl fmt::Display for VoiceLoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VoiceLoopState::Idle => "idle",
            VoiceLoopState::Speaking => "speaking",
            VoiceLoopState::Listening => "listening",
            VoiceLoopState::Transcribing => "transcribing",
        };
        write!(f, "{}", label)
    }
}
