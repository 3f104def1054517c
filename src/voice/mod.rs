//! Hands-free voice loop
//!
//! The loop itself is a pure state machine ([`VoiceLoop`]); audio
//! devices, clocks and encodings stay at the edges so the turn-taking
//! rules can be tested without hardware.

pub mod capture;
pub mod machine;
pub mod state;

pub use capture::{rms, CaptureBuffer, CapturedAudio, SpokenAudio};
pub use machine::{FrameOutcome, VoiceConfig, VoiceLoop};
pub use state::VoiceLoopState;
