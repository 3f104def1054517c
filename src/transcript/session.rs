//! Explicit per-session context
//!
//! Replaces ambient UI/session globals with a struct handed to the
//! conversation loop, with an explicit lifecycle: created on login,
//! reset on new chat, reset on logout.

/// State scoped to one user's active session
#[derive(Clone, Debug)]
pub struct SessionContext {
    /// Storage key identifying the user
    pub user_key: String,

    /// Stable session id, minted on first successful save
    pub session_id: Option<String>,

    /// Whether the opening greeting has been produced
    pub greeted: bool,

    /// Whether voice mode is enabled
    pub voice_mode: bool,

    /// Monotonic token of the last processed captured-audio event
    pub last_capture_ts: Option<u64>,
}

impl SessionContext {
    pub fn new(user_key: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
            session_id: None,
            greeted: false,
            voice_mode: false,
            last_capture_ts: None,
        }
    }

    /// Start a fresh chat for the same user. Voice mode preference is
    /// kept; everything tied to the old session is dropped.
    pub fn reset_for_new_chat(&mut self) {
        self.session_id = None;
        self.greeted = false;
        self.last_capture_ts = None;
    }

    /// Full reset on logout
    pub fn reset_on_logout(&mut self) {
        self.reset_for_new_chat();
        self.voice_mode = false;
    }

    /// Adopt a session loaded from storage
    pub fn adopt_loaded(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
        self.greeted = true;
        self.last_capture_ts = None;
    }

    /// Record a captured-audio token if it has not been seen yet.
    ///
    /// Returns false for a repeat delivery of the same token, in which
    /// case the capture must be discarded.
    pub fn accept_capture(&mut self, timestamp: u64) -> bool {
        if self.last_capture_ts == Some(timestamp) {
            return false;
        }
        self.last_capture_ts = Some(timestamp);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chat_keeps_voice_mode() {
        let mut ctx = SessionContext::new("acme_pvt_ltd");
        ctx.voice_mode = true;
        ctx.session_id = Some("20260830_101500".to_string());
        ctx.greeted = true;

        ctx.reset_for_new_chat();

        assert!(ctx.voice_mode);
        assert!(ctx.session_id.is_none());
        assert!(!ctx.greeted);
    }

    #[test]
    fn test_logout_clears_voice_mode() {
        let mut ctx = SessionContext::new("acme_pvt_ltd");
        ctx.voice_mode = true;
        ctx.reset_on_logout();
        assert!(!ctx.voice_mode);
    }

    #[test]
    fn test_capture_dedup() {
        let mut ctx = SessionContext::new("acme_pvt_ltd");
        assert!(ctx.accept_capture(1000));
        assert!(!ctx.accept_capture(1000));
        assert!(ctx.accept_capture(1001));
    }

    #[test]
    fn test_adopt_loaded_marks_greeted() {
        let mut ctx = SessionContext::new("acme_pvt_ltd");
        ctx.adopt_loaded("20260830_101500");
        assert!(ctx.greeted);
        assert_eq!(ctx.session_id.as_deref(), Some("20260830_101500"));
    }
}
