//! Conversation orchestration and the channel-driven pipeline

pub mod conversation;
pub mod pipeline;

pub use conversation::{CaptureOutcome, ConversationLoop, TurnOutcome};
pub use pipeline::{AssistantPipeline, LoopCommand, LoopEvent};
