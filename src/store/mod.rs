//! SessionStore: durable chat sessions over a keyed table service
//!
//! One row per (user message, following assistant response) pair; a
//! session is always re-persisted wholesale (delete-then-insert), so
//! replaying a save is idempotent. Storage failures are typed as
//! [`StorageError`] and the orchestration layer explicitly chooses to
//! log-and-continue; the in-memory transcript stays authoritative.

pub mod memory;
pub mod rest;
pub mod rows;

pub use memory::MemorySessionStore;
pub use rest::RestSessionStore;

use crate::transcript::Transcript;
use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(String),

    #[error("storage returned status {0}")]
    Status(u16),

    #[error("malformed storage payload: {0}")]
    Decode(String),

    #[error("storage runtime error: {0}")]
    Runtime(String),
}

/// One persisted row of the `chats` table (stable storage contract)
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatRow {
    pub id: i64,
    pub user_key: String,
    pub session_id: String,
    pub title: String,
    pub user_message: String,
    pub assistant_response: String,
    pub created_at: DateTime<Utc>,
}

/// Listing entry for one saved session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub saved_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Durable session operations
pub trait SessionStore: Send + Sync {
    /// Replace all persisted rows for `(user_key, session_id)` with a
    /// fresh set derived from the transcript. Mints a session id when
    /// none is given. Returns the (possibly minted) session id.
    fn save(
        &self,
        user_key: &str,
        session_id: Option<&str>,
        transcript: &Transcript,
        title: &str,
    ) -> Result<String, StorageError>;

    /// All saved sessions for a user, most recently saved first
    fn list(&self, user_key: &str) -> Result<Vec<SessionSummary>, StorageError>;

    /// Rebuild a transcript from persisted rows in insertion order
    fn load(&self, user_key: &str, session_id: &str) -> Result<Transcript, StorageError>;

    /// Remove all rows for a session; idempotent on a missing session
    fn delete(&self, user_key: &str, session_id: &str) -> Result<(), StorageError>;
}

const SESSION_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Mints timestamp-derived session ids that are human-sortable and
/// strictly monotonic within one process.
#[derive(Debug, Default)]
pub struct IdMinter {
    last: Mutex<Option<String>>,
}

impl IdMinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self, now: DateTime<Utc>) -> String {
        let mut last = self.last.lock();
        let mut candidate = now.format(SESSION_ID_FORMAT).to_string();

        // Same-second mints bump one second past the previous id
        if let Some(prev) = last.as_deref() {
            if prev >= candidate.as_str() {
                if let Ok(dt) = NaiveDateTime::parse_from_str(prev, SESSION_ID_FORMAT) {
                    candidate = (dt + chrono::Duration::seconds(1))
                        .format(SESSION_ID_FORMAT)
                        .to_string();
                }
            }
        }

        *last = Some(candidate.clone());
        candidate
    }
}

/// Generate a session title from the first user message
pub fn make_title(transcript: &Transcript) -> String {
    match transcript.first_user_turn() {
        Some(turn) => {
            let text = turn.content.trim().replace('\n', " ");
            let mut title: String = text.chars().take(45).collect();
            if text.chars().count() > 45 {
                title.push('…');
            }
            title
        }
        None => "Untitled chat".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_minted_ids_are_monotonic() {
        let minter = IdMinter::new();
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 10, 15, 0).unwrap();

        let first = minter.mint(now);
        let second = minter.mint(now);
        let third = minter.mint(now);

        assert_eq!(first, "20260830_101500");
        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn test_minted_id_follows_clock() {
        let minter = IdMinter::new();
        let t0 = Utc.with_ymd_and_hms(2026, 8, 30, 10, 15, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 8, 30, 10, 16, 0).unwrap();

        minter.mint(t0);
        assert_eq!(minter.mint(t1), "20260830_101600");
    }

    #[test]
    fn test_make_title_truncates() {
        let mut t = Transcript::new();
        t.push_user("a".repeat(60));
        let title = make_title(&t);
        assert_eq!(title.chars().count(), 46);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn test_make_title_skips_greeting() {
        let mut t = Transcript::new();
        t.push_assistant("Welcome to the CRM assistant!");
        t.push_user("Tell me about\nBigin");
        assert_eq!(make_title(&t), "Tell me about Bigin");
    }

    #[test]
    fn test_make_title_untitled_without_user_turn() {
        let mut t = Transcript::new();
        t.push_assistant("Welcome!");
        assert_eq!(make_title(&t), "Untitled chat");
    }
}
