//! TurnStream: the seam over the opaque completion service
//!
//! Turns a conversation history into a lazily-produced sequence of text
//! fragments, classifying transport failures into the fixed user-facing
//! fragments defined on [`AriaError`].

pub mod client;
pub mod prompts;

pub use client::GroqTurnStream;

use crate::transcript::Turn;
use crate::{AriaError, Result};

/// Streaming access to the completion service.
///
/// A stream is finite and not restartable; fragments are delivered to
/// `on_fragment` in the order the service emits them.
pub trait TurnStream: Send + Sync {
    /// Stream a reply for the given conversation, oldest turn first.
    /// Returns the full concatenated reply on success.
    fn stream(
        &self,
        credential: &str,
        model: &str,
        turns: &[Turn],
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String>;

    /// Non-streaming variant, used for the opening greeting only
    fn complete(&self, credential: &str, model: &str, turns: &[Turn]) -> Result<String>;
}

/// Classify an opaque completion-service failure by string/code matching.
///
/// The service error surface is not typed, so this mirrors the provider's
/// observable failure strings: HTTP 401 / "invalid_api_key" for a bad key,
/// "rate_limit" for throttling, "connection" for transport trouble.
pub fn classify_completion_error(err: &str) -> AriaError {
    let lower = err.to_lowercase();
    if err.contains("401") || lower.contains("invalid_api_key") {
        AriaError::InvalidCredential
    } else if lower.contains("rate_limit") {
        AriaError::RateLimited
    } else if lower.contains("connection") {
        AriaError::ConnectionError(err.to_string())
    } else {
        AriaError::CompletionError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_invalid_credential() {
        assert!(matches!(
            classify_completion_error("401 Unauthorized"),
            AriaError::InvalidCredential
        ));
        assert!(matches!(
            classify_completion_error("code: invalid_api_key"),
            AriaError::InvalidCredential
        ));
    }

    #[test]
    fn test_classify_rate_limit() {
        assert!(matches!(
            classify_completion_error("429 rate_limit_exceeded"),
            AriaError::RateLimited
        ));
    }

    #[test]
    fn test_classify_connection() {
        assert!(matches!(
            classify_completion_error("connection refused"),
            AriaError::ConnectionError(_)
        ));
    }

    #[test]
    fn test_classify_unknown() {
        let err = classify_completion_error("model exploded");
        assert!(matches!(err, AriaError::CompletionError(_)));
        assert_eq!(err.user_message(), "Error: model exploded");
    }
}
