use serde::{Deserialize, Serialize};

/// Author of a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire representation used by the completion service
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message authored by either the user or the assistant.
///
/// Immutable once appended; the single in-flight assistant reply is
/// accumulated outside the transcript and appended only on finalization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub sequence_index: usize,
}

/// Ordered sequence of turns for the active session.
///
/// Insertion order is the sole ordering key. Owned exclusively by the
/// conversation loop; replaced wholesale when a session is loaded or a
/// new chat starts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    /// Append an assistant turn
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        let sequence_index = self.turns.len();
        self.turns.push(Turn {
            role,
            content: content.into(),
            sequence_index,
        });
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// First user turn, used for titling sessions
    pub fn first_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().find(|t| t.role == Role::User)
    }

    /// Discard all turns (new chat)
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Rebuild from loaded (role, content) pairs, reassigning sequence
    /// indices from insertion order.
    pub fn from_pairs(pairs: Vec<(Role, String)>) -> Self {
        let mut transcript = Self::new();
        for (role, content) in pairs {
            transcript.push(role, content);
        }
        transcript
    }
}
