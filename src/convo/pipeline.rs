//! Channel-driven assistant pipeline
//!
//! Wraps a [`ConversationLoop`] in a worker thread behind bounded
//! command/event channels so a front-end never blocks on network calls.
//! Commands are processed strictly in order, which also enforces the
//! one-turn-in-flight rule at the process level.

use crate::convo::{CaptureOutcome, ConversationLoop};
use crate::store::SessionSummary;
use crate::transcript::Turn;
use crate::voice::{CapturedAudio, SpokenAudio};
use crate::{AriaError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

const COMMAND_DEPTH: usize = 64;
const EVENT_DEPTH: usize = 256;

/// Commands a front-end sends to the worker
#[derive(Clone, Debug)]
pub enum LoopCommand {
    /// Submit a typed user message
    Submit(String),
    /// Deliver one captured recording
    Capture(CapturedAudio),
    /// Produce the opening greeting if the session is fresh
    Greet,
    /// Drop the live transcript and start over
    NewChat,
    /// Replace the live transcript with a saved session
    LoadSession(String),
    /// Delete a saved session
    DeleteSession(String),
    /// Request the saved-session list
    ListSessions,
    /// Toggle hands-free mode
    SetVoiceMode(bool),
    /// Assistant audio finished playing on the host
    PlaybackDone,
    /// Stop the worker
    Shutdown,
}

/// Events the worker reports back
#[derive(Clone, Debug)]
pub enum LoopEvent {
    /// One streamed fragment of the in-flight reply
    Fragment(String),
    /// The reply was finalized and appended to the transcript
    TurnFinalized(String),
    /// Synthesized audio for the finalized reply, base64-encoded for
    /// front-end playback
    SpeechReady(SpokenAudio),
    /// The opening greeting
    Greeting(String),
    /// A session save succeeded under this id
    SessionSaved(String),
    /// The saved-session list
    SessionList(Vec<SessionSummary>),
    /// A saved session replaced the live transcript
    SessionLoaded { session_id: String, turns: Vec<Turn> },
    /// Something recoverable went wrong
    Warning(String),
    /// Something unrecoverable went wrong
    Error(String),
}

pub struct AssistantPipeline {
    command_tx: Sender<LoopCommand>,
    event_rx: Receiver<LoopEvent>,
    worker: Option<JoinHandle<()>>,
}

impl AssistantPipeline {
    /// Spawn the worker around an already-configured loop
    pub fn start(convo: ConversationLoop) -> Self {
        let (command_tx, command_rx) = bounded::<LoopCommand>(COMMAND_DEPTH);
        let (event_tx, event_rx) = bounded::<LoopEvent>(EVENT_DEPTH);

        let worker = thread::Builder::new()
            .name("aria-convo".to_string())
            .spawn(move || run_worker(convo, command_rx, event_tx))
            .ok();

        Self {
            command_tx,
            event_rx,
            worker,
        }
    }

    pub fn send(&self, command: LoopCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| AriaError::ChannelError(e.to_string()))
    }

    /// Drain without blocking; call from the front-end's tick
    pub fn poll(&self) -> Vec<LoopEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Block for the next event, for hosts without a tick loop
    pub fn recv(&self) -> Result<LoopEvent> {
        self.event_rx
            .recv()
            .map_err(|e| AriaError::ChannelError(e.to_string()))
    }
}

impl Drop for AssistantPipeline {
    fn drop(&mut self) {
        let _ = self.command_tx.send(LoopCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(
    mut convo: ConversationLoop,
    command_rx: Receiver<LoopCommand>,
    event_tx: Sender<LoopEvent>,
) {
    info!("conversation worker started");

    while let Ok(command) = command_rx.recv() {
        match command {
            LoopCommand::Submit(text) => {
                submit_turn(&mut convo, &text, &event_tx);
            }
            LoopCommand::Capture(capture) => {
                handle_capture(&mut convo, &capture, &event_tx);
            }
            LoopCommand::Greet => match convo.greet() {
                Some(outcome) => {
                    let _ = event_tx.send(LoopEvent::Greeting(outcome.reply));
                    if !outcome.audio.is_empty() {
                        let _ = event_tx
                            .send(LoopEvent::SpeechReady(SpokenAudio::from_bytes(&outcome.audio)));
                    }
                    if let Some(session_id) = outcome.session_id {
                        let _ = event_tx.send(LoopEvent::SessionSaved(session_id));
                    }
                }
                None => {
                    let _ = event_tx.send(LoopEvent::Warning("no greeting produced".to_string()));
                }
            },
            LoopCommand::NewChat => {
                convo.new_chat();
            }
            LoopCommand::LoadSession(session_id) => match convo.load_session(&session_id) {
                Ok(()) => {
                    let _ = event_tx.send(LoopEvent::SessionLoaded {
                        session_id,
                        turns: convo.transcript().turns().to_vec(),
                    });
                }
                Err(e) => {
                    let _ = event_tx.send(LoopEvent::Warning(format!("load failed: {}", e)));
                }
            },
            LoopCommand::DeleteSession(session_id) => {
                if let Err(e) = convo.delete_session(&session_id) {
                    let _ = event_tx.send(LoopEvent::Warning(format!("delete failed: {}", e)));
                }
            }
            LoopCommand::ListSessions => match convo.list_sessions() {
                Ok(sessions) => {
                    let _ = event_tx.send(LoopEvent::SessionList(sessions));
                }
                Err(e) => {
                    let _ = event_tx.send(LoopEvent::Warning(format!("list failed: {}", e)));
                }
            },
            LoopCommand::SetVoiceMode(enabled) => {
                convo.set_voice_mode(enabled);
            }
            LoopCommand::PlaybackDone => {
                convo.voice().on_playback_done();
            }
            LoopCommand::Shutdown => {
                info!("conversation worker stopping");
                break;
            }
        }
    }
}

fn submit_turn(convo: &mut ConversationLoop, text: &str, event_tx: &Sender<LoopEvent>) {
    let fragment_tx = event_tx.clone();
    let mut on_fragment = move |fragment: &str| {
        let _ = fragment_tx.send(LoopEvent::Fragment(fragment.to_string()));
    };

    let wants_voice = convo.session().voice_mode;
    match convo.submit(text, wants_voice, &mut on_fragment) {
        Ok(outcome) => {
            let _ = event_tx.send(LoopEvent::TurnFinalized(outcome.reply));
            if !outcome.audio.is_empty() {
                let _ =
                    event_tx.send(LoopEvent::SpeechReady(SpokenAudio::from_bytes(&outcome.audio)));
            }
            if let Some(session_id) = outcome.session_id {
                let _ = event_tx.send(LoopEvent::SessionSaved(session_id));
            }
        }
        Err(e @ AriaError::TurnInFlight) => {
            warn!("{}", e);
            let _ = event_tx.send(LoopEvent::Warning(e.to_string()));
        }
        Err(e) => {
            error!("turn failed: {}", e);
            let _ = event_tx.send(LoopEvent::Error(e.to_string()));
        }
    }
}

fn handle_capture(
    convo: &mut ConversationLoop,
    capture: &CapturedAudio,
    event_tx: &Sender<LoopEvent>,
) {
    let fragment_tx = event_tx.clone();
    let mut on_fragment = move |fragment: &str| {
        let _ = fragment_tx.send(LoopEvent::Fragment(fragment.to_string()));
    };

    match convo.handle_capture(capture, &mut on_fragment) {
        Ok(CaptureOutcome::Duplicate) => {}
        Ok(CaptureOutcome::Unusable(text)) => {
            let _ = event_tx.send(LoopEvent::Warning(format!(
                "transcription unusable: {:?}",
                text
            )));
        }
        Ok(CaptureOutcome::Submitted(outcome)) => {
            let _ = event_tx.send(LoopEvent::TurnFinalized(outcome.reply));
            if !outcome.audio.is_empty() {
                let _ =
                    event_tx.send(LoopEvent::SpeechReady(SpokenAudio::from_bytes(&outcome.audio)));
            }
            if let Some(session_id) = outcome.session_id {
                let _ = event_tx.send(LoopEvent::SessionSaved(session_id));
            }
        }
        Err(e) => {
            error!("capture failed: {}", e);
            let _ = event_tx.send(LoopEvent::Error(e.to_string()));
        }
    }
}
