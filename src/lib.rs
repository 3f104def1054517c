pub mod config;
pub mod convo;
pub mod llm;
pub mod speech;
pub mod store;
pub mod transcript;
pub mod voice;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AriaError {
    #[error("no API credential configured")]
    MissingCredential,

    #[error("invalid API credential")]
    InvalidCredential,

    #[error("rate limited by completion service")]
    RateLimited,

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("completion error: {0}")]
    CompletionError(String),

    #[error("a turn is already in flight")]
    TurnInFlight,

    #[error("transcription error: {0}")]
    TranscriptionError(String),

    #[error("synthesis error: {0}")]
    SynthesisError(String),

    #[error("channel error: {0}")]
    ChannelError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl AriaError {
    /// Check if this error is recoverable without user intervention
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Credential problems require the user to fix their key
            AriaError::MissingCredential => false,
            AriaError::InvalidCredential => false,
            // The next user action is the implicit retry
            AriaError::RateLimited => true,
            AriaError::ConnectionError(_) => true,
            AriaError::CompletionError(_) => true,
            AriaError::TurnInFlight => true,
            AriaError::TranscriptionError(_) => true,
            AriaError::SynthesisError(_) => true,
            AriaError::ChannelError(_) => false,
            AriaError::ConfigError(_) => false,
        }
    }

    /// The fixed assistant-visible fragment substituted for the reply
    /// when a turn fails. These become part of the transcript like any
    /// other assistant content.
    pub fn user_message(&self) -> String {
        match self {
            AriaError::MissingCredential => {
                "Please add your Groq API key to continue.".to_string()
            }
            AriaError::InvalidCredential => {
                "Invalid API key. Please check your credentials.".to_string()
            }
            AriaError::RateLimited => "Rate limit hit. Please wait a moment.".to_string(),
            AriaError::ConnectionError(_) => {
                "Connection error. Check your internet.".to_string()
            }
            AriaError::CompletionError(e) => format!("Error: {}", e),
            AriaError::TurnInFlight => {
                "Still working on the previous reply. One moment.".to_string()
            }
            AriaError::TranscriptionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            AriaError::SynthesisError(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            AriaError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            AriaError::ConfigError(_) => "Configuration error. Please check settings.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AriaError>;
