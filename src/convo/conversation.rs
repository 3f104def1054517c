//! Conversation orchestration
//!
//! Owns the live transcript and session context and drives one turn at
//! a time through the completion, speech and storage seams. Service
//! failures never abort a turn: completion errors surface as the
//! assistant's reply text and storage failures are logged while the
//! in-memory transcript stays authoritative.

use crate::config::AssistantConfig;
use crate::llm::TurnStream;
use crate::speech::{is_transcription_usable, SpeechBridge};
use crate::store::{make_title, SessionStore, SessionSummary, StorageError};
use crate::transcript::{SessionContext, Transcript};
use crate::voice::{CapturedAudio, VoiceLoop};
use crate::{AriaError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Instruction used to open a fresh session, never persisted as a turn
const GREETING_INSTRUCTION: &str =
    "Greet the user warmly in one short sentence and ask which business \
     they want to set up CRM for.";

/// Result of one completed turn
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    /// Finalized assistant reply
    pub reply: String,
    /// Synthesized reply audio; empty in text mode or on synthesis
    /// failure
    pub audio: Vec<u8>,
    /// Session id after the save attempt, when one is known
    pub session_id: Option<String>,
}

/// What came of one delivered audio capture
#[derive(Clone, Debug)]
pub enum CaptureOutcome {
    /// Same capture timestamp as the previous delivery; dropped
    Duplicate,
    /// Transcription was empty or failed; the mic reopens
    Unusable(String),
    /// Transcription was submitted as a user turn
    Submitted(TurnOutcome),
}

pub struct ConversationLoop {
    config: AssistantConfig,
    llm: Arc<dyn TurnStream>,
    speech: Arc<dyn SpeechBridge>,
    store: Arc<dyn SessionStore>,
    transcript: Transcript,
    session: SessionContext,
    voice: VoiceLoop,
    in_flight: bool,
}

impl ConversationLoop {
    pub fn new(
        config: AssistantConfig,
        llm: Arc<dyn TurnStream>,
        speech: Arc<dyn SpeechBridge>,
        store: Arc<dyn SessionStore>,
        user_key: impl Into<String>,
    ) -> Self {
        let voice = VoiceLoop::new(config.voice);
        Self {
            config,
            llm,
            speech,
            store,
            transcript: Transcript::new(),
            session: SessionContext::new(user_key),
            voice,
            in_flight: false,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn voice(&mut self) -> &mut VoiceLoop {
        &mut self.voice
    }

    /// Toggle hands-free mode
    pub fn set_voice_mode(&mut self, enabled: bool) {
        self.session.voice_mode = enabled;
        if enabled {
            self.voice.enable();
        } else {
            self.voice.disable();
        }
    }

    /// Submit one user message and finalize the assistant reply.
    ///
    /// Fragments stream through `on_fragment` as they arrive. A second
    /// submit while one is in flight is rejected with
    /// [`AriaError::TurnInFlight`]; every other failure becomes the
    /// reply text so the exchange is still recorded.
    pub fn submit(
        &mut self,
        text: &str,
        wants_voice_reply: bool,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<TurnOutcome> {
        if self.in_flight {
            return Err(AriaError::TurnInFlight);
        }
        self.in_flight = true;
        let outcome = self.run_turn(text, wants_voice_reply, on_fragment);
        self.in_flight = false;
        Ok(outcome)
    }

    fn run_turn(
        &mut self,
        text: &str,
        wants_voice_reply: bool,
        on_fragment: &mut dyn FnMut(&str),
    ) -> TurnOutcome {
        self.transcript.push_user(text);

        let reply = if !self.config.has_credential() {
            AriaError::MissingCredential.user_message()
        } else {
            match self.llm.stream(
                &self.config.credential,
                &self.config.model,
                self.transcript.turns(),
                on_fragment,
            ) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("completion failed: {}", e);
                    e.user_message()
                }
            }
        };

        self.transcript.push_assistant(reply.clone());
        let audio = if wants_voice_reply {
            self.speak(&reply)
        } else {
            Vec::new()
        };
        self.persist();

        TurnOutcome {
            reply,
            audio,
            session_id: self.session.session_id.clone(),
        }
    }

    /// Open a fresh session with a model-written greeting. Best-effort;
    /// returns None when already greeted, the transcript has content,
    /// no credential is set, or the call fails.
    pub fn greet(&mut self) -> Option<TurnOutcome> {
        if self.session.greeted || !self.transcript.is_empty() || !self.config.has_credential() {
            return None;
        }

        let mut prompt = Transcript::new();
        prompt.push_user(GREETING_INSTRUCTION);

        match self
            .llm
            .complete(&self.config.credential, &self.config.model, prompt.turns())
        {
            Ok(greeting) => {
                self.session.greeted = true;
                self.transcript.push_assistant(greeting.clone());
                let audio = if self.session.voice_mode {
                    self.speak(&greeting)
                } else {
                    Vec::new()
                };
                self.persist();
                Some(TurnOutcome {
                    reply: greeting,
                    audio,
                    session_id: self.session.session_id.clone(),
                })
            }
            Err(e) => {
                warn!("greeting failed: {}", e);
                None
            }
        }
    }

    /// Route one delivered capture through dedup, transcription and
    /// (when usable) a full turn.
    pub fn handle_capture(
        &mut self,
        capture: &CapturedAudio,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<CaptureOutcome> {
        if !self.session.accept_capture(capture.captured_at) {
            debug!(captured_at = capture.captured_at, "duplicate capture dropped");
            return Ok(CaptureOutcome::Duplicate);
        }

        let audio = capture.decode()?;
        let text = self.speech.transcribe(&self.config.credential, &audio);

        if !is_transcription_usable(&text) {
            self.voice.on_transcription_unusable();
            return Ok(CaptureOutcome::Unusable(text));
        }

        self.voice.on_transcribed();
        let outcome = self.submit(&text, true, on_fragment)?;
        Ok(CaptureOutcome::Submitted(outcome))
    }

    /// Replace the live transcript with a saved session
    pub fn load_session(&mut self, session_id: &str) -> std::result::Result<(), StorageError> {
        let loaded = self.store.load(&self.session.user_key, session_id)?;
        info!(session_id, turns = loaded.len(), "session loaded");
        self.transcript = loaded;
        self.session.adopt_loaded(session_id);
        Ok(())
    }

    /// Drop the live transcript and start over; voice mode carries over
    pub fn new_chat(&mut self) {
        self.transcript.clear();
        self.session.reset_for_new_chat();
    }

    pub fn list_sessions(&self) -> std::result::Result<Vec<SessionSummary>, StorageError> {
        self.store.list(&self.session.user_key)
    }

    /// Delete a saved session; when it is the live one, start fresh
    pub fn delete_session(&mut self, session_id: &str) -> std::result::Result<(), StorageError> {
        self.store.delete(&self.session.user_key, session_id)?;
        if self.session.session_id.as_deref() == Some(session_id) {
            self.new_chat();
        }
        Ok(())
    }

    fn speak(&mut self, reply: &str) -> Vec<u8> {
        let audio = self.speech.synthesize(reply);
        if !audio.is_empty() {
            self.voice.on_playback_queued();
        } else {
            // No playback will arrive to reopen the mic; do it now
            self.voice.on_reply_without_audio();
        }
        audio
    }

    fn persist(&mut self) {
        let title = make_title(&self.transcript);
        match self.store.save(
            &self.session.user_key,
            self.session.session_id.as_deref(),
            &self.transcript,
            &title,
        ) {
            Ok(session_id) => {
                self.session.session_id = Some(session_id);
            }
            Err(e) => {
                // Storage is best-effort; the live transcript stays intact
                warn!("session save failed: {}", e);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn set_in_flight_for_test(&mut self, value: bool) {
        self.in_flight = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::NullSpeech;
    use crate::store::MemorySessionStore;
    use crate::transcript::Turn;

    struct EchoStream;

    impl TurnStream for EchoStream {
        fn stream(
            &self,
            _credential: &str,
            _model: &str,
            turns: &[Turn],
            on_fragment: &mut dyn FnMut(&str),
        ) -> Result<String> {
            let last = turns.last().map(|t| t.content.clone()).unwrap_or_default();
            let reply = format!("echo: {}", last);
            on_fragment(&reply);
            Ok(reply)
        }

        fn complete(&self, _credential: &str, _model: &str, _turns: &[Turn]) -> Result<String> {
            Ok("hello there".to_string())
        }
    }

    fn test_loop() -> ConversationLoop {
        ConversationLoop::new(
            AssistantConfig::default().with_credential("gsk_test"),
            Arc::new(EchoStream),
            Arc::new(NullSpeech),
            Arc::new(MemorySessionStore::new()),
            "acme",
        )
    }

    #[test]
    fn test_second_submit_rejected_while_in_flight() {
        let mut convo = test_loop();
        convo.set_in_flight_for_test(true);

        let result = convo.submit("hello", false, &mut |_| {});
        assert!(matches!(result, Err(AriaError::TurnInFlight)));
        assert!(convo.transcript().is_empty());
    }

    #[test]
    fn test_in_flight_clears_after_turn() {
        let mut convo = test_loop();

        convo.submit("one", false, &mut |_| {}).unwrap();
        let again = convo.submit("two", false, &mut |_| {}).unwrap();

        assert_eq!(again.reply, "echo: two");
        assert_eq!(convo.transcript().len(), 4);
    }

    #[test]
    fn test_delete_live_session_starts_fresh() {
        let mut convo = test_loop();
        convo.submit("hello", false, &mut |_| {}).unwrap();
        let session_id = convo.session().session_id.clone().unwrap();

        convo.delete_session(&session_id).unwrap();

        assert!(convo.transcript().is_empty());
        assert!(convo.session().session_id.is_none());
    }
}
