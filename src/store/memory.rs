//! In-memory session store
//!
//! Backs text-only runs and tests when no storage service is
//! configured. Rows live in a shared Vec behind an RwLock; insertion
//! order doubles as creation order via a monotonic row id.

use crate::store::rows::{expand_rows, pair_rows, RowPair};
use crate::store::{ChatRow, IdMinter, SessionStore, SessionSummary, StorageError};
use crate::transcript::Transcript;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use tracing::debug;

#[derive(Default)]
pub struct MemorySessionStore {
    rows: RwLock<Vec<ChatRow>>,
    next_id: AtomicI64,
    saves: AtomicUsize,
    minter: IdMinter,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows currently held, across all users
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// How many save calls have been made against this store
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl SessionStore for MemorySessionStore {
    fn save(
        &self,
        user_key: &str,
        session_id: Option<&str>,
        transcript: &Transcript,
        title: &str,
    ) -> Result<String, StorageError> {
        self.saves.fetch_add(1, Ordering::Relaxed);

        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.minter.mint(Utc::now()),
        };

        let pairs = pair_rows(transcript);
        let now = Utc::now();

        let mut rows = self.rows.write();
        rows.retain(|r| !(r.user_key == user_key && r.session_id == session_id));
        for pair in pairs {
            rows.push(ChatRow {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                user_key: user_key.to_string(),
                session_id: session_id.clone(),
                title: title.to_string(),
                user_message: pair.user_message,
                assistant_response: pair.assistant_response,
                created_at: now,
            });
        }

        debug!(user_key, %session_id, "saved session");
        Ok(session_id)
    }

    fn list(&self, user_key: &str) -> Result<Vec<SessionSummary>, StorageError> {
        let rows = self.rows.read();
        let mut summaries: Vec<SessionSummary> = Vec::new();

        for row in rows.iter().filter(|r| r.user_key == user_key) {
            match summaries.iter_mut().find(|s| s.session_id == row.session_id) {
                Some(summary) => {
                    summary.message_count += 1;
                    if row.created_at >= summary.saved_at {
                        summary.saved_at = row.created_at;
                        summary.title = row.title.clone();
                    }
                }
                None => summaries.push(SessionSummary {
                    session_id: row.session_id.clone(),
                    title: row.title.clone(),
                    saved_at: row.created_at,
                    message_count: 1,
                }),
            }
        }

        // Most recently saved first; session ids break same-instant ties
        summaries.sort_by(|a, b| {
            b.saved_at
                .cmp(&a.saved_at)
                .then_with(|| b.session_id.cmp(&a.session_id))
        });
        Ok(summaries)
    }

    fn load(&self, user_key: &str, session_id: &str) -> Result<Transcript, StorageError> {
        let rows = self.rows.read();
        let mut matched: Vec<&ChatRow> = rows
            .iter()
            .filter(|r| r.user_key == user_key && r.session_id == session_id)
            .collect();
        matched.sort_by_key(|r| r.id);

        let pairs: Vec<RowPair> = matched
            .iter()
            .map(|r| RowPair {
                user_message: r.user_message.clone(),
                assistant_response: r.assistant_response.clone(),
            })
            .collect();

        Ok(expand_rows(&pairs))
    }

    fn delete(&self, user_key: &str, session_id: &str) -> Result<(), StorageError> {
        self.rows
            .write()
            .retain(|r| !(r.user_key == user_key && r.session_id == session_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transcript() -> Transcript {
        let mut t = Transcript::new();
        t.push_user("What's Bigin?");
        t.push_assistant("Bigin is Zoho's CRM.");
        t
    }

    #[test]
    fn test_save_mints_id_once() {
        let store = MemorySessionStore::new();
        let t = sample_transcript();

        let id = store.save("priya", None, &t, "What's Bigin?").unwrap();
        let again = store.save("priya", Some(&id), &t, "What's Bigin?").unwrap();

        assert_eq!(id, again);
        assert_eq!(store.row_count(), 1);
    }

    #[test]
    fn test_save_is_full_replace() {
        let store = MemorySessionStore::new();
        let mut t = sample_transcript();
        let id = store.save("priya", None, &t, "t").unwrap();

        t.push_user("Pricing?");
        t.push_assistant("Starts at $7.");
        store.save("priya", Some(&id), &t, "t").unwrap();

        assert_eq!(store.row_count(), 2);
        let restored = store.load("priya", &id).unwrap();
        assert_eq!(restored.len(), 4);
    }

    #[test]
    fn test_sessions_isolated_per_user() {
        let store = MemorySessionStore::new();
        let t = sample_transcript();

        let id = store.save("priya", None, &t, "t").unwrap();
        store.save("dev", None, &t, "t").unwrap();

        assert_eq!(store.list("priya").unwrap().len(), 1);
        assert_eq!(store.list("dev").unwrap().len(), 1);
        assert!(store.load("dev", &id).unwrap().is_empty());
    }

    #[test]
    fn test_list_most_recent_first() {
        let store = MemorySessionStore::new();
        let t = sample_transcript();

        let a = store.save("priya", None, &t, "first").unwrap();
        let b = store.save("priya", None, &t, "second").unwrap();
        // Re-saving the older session makes it the most recent again
        store.save("priya", Some(&a), &t, "first").unwrap();

        let listed = store.list("priya").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].session_id, a);
        assert_eq!(listed[1].session_id, b);
        assert_eq!(listed[0].message_count, 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemorySessionStore::new();
        let t = sample_transcript();
        let id = store.save("priya", None, &t, "t").unwrap();

        store.delete("priya", &id).unwrap();
        store.delete("priya", &id).unwrap();

        assert_eq!(store.row_count(), 0);
        assert!(store.list("priya").unwrap().is_empty());
    }

    #[test]
    fn test_load_unknown_session_is_empty() {
        let store = MemorySessionStore::new();
        let t = store.load("priya", "20260830_101500").unwrap();
        assert!(t.is_empty());
    }
}
