//! PostgREST-backed session store
//!
//! Talks to a Supabase-style `chats` table through its REST surface:
//! `eq.` filters, `order=` on `created_at`, JSON array inserts. Save is
//! delete-then-insert so a session is always re-persisted wholesale.

use crate::config::STORAGE_TIMEOUT;
use crate::store::rows::{expand_rows, pair_rows, RowPair};
use crate::store::{IdMinter, SessionStore, SessionSummary, StorageError};
use crate::transcript::Transcript;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tracing::debug;

#[derive(Serialize)]
struct InsertRow<'a> {
    user_key: &'a str,
    session_id: &'a str,
    title: &'a str,
    user_message: String,
    assistant_response: String,
}

#[derive(Deserialize)]
struct ListRow {
    session_id: String,
    title: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct LoadRow {
    user_message: String,
    assistant_response: String,
}

pub struct RestSessionStore {
    http: reqwest::Client,
    runtime: Runtime,
    table_url: String,
    api_key: String,
    minter: IdMinter,
}

impl RestSessionStore {
    /// `base_url` is the project root, e.g. `https://xyz.supabase.co`
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let runtime =
            Runtime::new().map_err(|e| StorageError::Runtime(e.to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            runtime,
            table_url: format!("{}/rest/v1/chats", base_url.into().trim_end_matches('/')),
            api_key: api_key.into(),
            minter: IdMinter::new(),
        })
    }

    fn request(&self, method: reqwest::Method, query: &[(&str, String)]) -> reqwest::RequestBuilder {
        self.http
            .request(method, &self.table_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .timeout(STORAGE_TIMEOUT)
    }

    async fn send_checked(
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StorageError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(StorageError::Status(resp.status().as_u16()));
        }
        Ok(resp)
    }

    async fn delete_rows(&self, user_key: &str, session_id: &str) -> Result<(), StorageError> {
        let query = [
            ("user_key", format!("eq.{user_key}")),
            ("session_id", format!("eq.{session_id}")),
        ];
        Self::send_checked(self.request(reqwest::Method::DELETE, &query)).await?;
        Ok(())
    }

    async fn save_inner(
        &self,
        user_key: &str,
        session_id: &str,
        transcript: &Transcript,
        title: &str,
    ) -> Result<(), StorageError> {
        self.delete_rows(user_key, session_id).await?;

        let rows: Vec<InsertRow> = pair_rows(transcript)
            .into_iter()
            .map(|pair| InsertRow {
                user_key,
                session_id,
                title,
                user_message: pair.user_message,
                assistant_response: pair.assistant_response,
            })
            .collect();

        if rows.is_empty() {
            return Ok(());
        }

        Self::send_checked(self.request(reqwest::Method::POST, &[]).json(&rows)).await?;
        Ok(())
    }

    async fn list_inner(&self, user_key: &str) -> Result<Vec<SessionSummary>, StorageError> {
        let query = [
            ("user_key", format!("eq.{user_key}")),
            ("select", "session_id,title,created_at".to_string()),
            ("order", "created_at.desc".to_string()),
        ];

        let resp = Self::send_checked(self.request(reqwest::Method::GET, &query)).await?;
        let rows: Vec<ListRow> = resp
            .json()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))?;

        // Rows arrive newest first, so first sight of a session id fixes
        // both its place in the list and its saved_at
        let mut summaries: Vec<SessionSummary> = Vec::new();
        for row in rows {
            match summaries.iter_mut().find(|s| s.session_id == row.session_id) {
                Some(summary) => summary.message_count += 1,
                None => summaries.push(SessionSummary {
                    session_id: row.session_id,
                    title: row.title.unwrap_or_else(|| "Untitled chat".to_string()),
                    saved_at: row.created_at,
                    message_count: 1,
                }),
            }
        }
        Ok(summaries)
    }

    async fn load_inner(
        &self,
        user_key: &str,
        session_id: &str,
    ) -> Result<Transcript, StorageError> {
        let query = [
            ("user_key", format!("eq.{user_key}")),
            ("session_id", format!("eq.{session_id}")),
            ("select", "user_message,assistant_response".to_string()),
            ("order", "created_at.asc,id.asc".to_string()),
        ];

        let resp = Self::send_checked(self.request(reqwest::Method::GET, &query)).await?;
        let rows: Vec<LoadRow> = resp
            .json()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))?;

        let pairs: Vec<RowPair> = rows
            .into_iter()
            .map(|r| RowPair {
                user_message: r.user_message,
                assistant_response: r.assistant_response,
            })
            .collect();

        Ok(expand_rows(&pairs))
    }
}

impl SessionStore for RestSessionStore {
    fn save(
        &self,
        user_key: &str,
        session_id: Option<&str>,
        transcript: &Transcript,
        title: &str,
    ) -> Result<String, StorageError> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.minter.mint(Utc::now()),
        };

        self.runtime
            .block_on(self.save_inner(user_key, &session_id, transcript, title))?;

        debug!(user_key, %session_id, "saved session");
        Ok(session_id)
    }

    fn list(&self, user_key: &str) -> Result<Vec<SessionSummary>, StorageError> {
        self.runtime.block_on(self.list_inner(user_key))
    }

    fn load(&self, user_key: &str, session_id: &str) -> Result<Transcript, StorageError> {
        self.runtime.block_on(self.load_inner(user_key, session_id))
    }

    fn delete(&self, user_key: &str, session_id: &str) -> Result<(), StorageError> {
        self.runtime
            .block_on(self.delete_rows(user_key, session_id))
    }
}
