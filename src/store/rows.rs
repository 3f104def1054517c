//! Transcript-to-row pairing
//!
//! Each persisted row carries one user message and the assistant
//! response that followed it. A greeting that opens a session (an
//! assistant turn before any user turn) gets a row with an empty user
//! message. An unanswered user turn at the tail of the transcript is
//! not durable yet and is skipped.

use crate::transcript::{Role, Transcript};

/// Message content of one row, before storage metadata is attached
#[derive(Clone, Debug, PartialEq)]
pub struct RowPair {
    pub user_message: String,
    pub assistant_response: String,
}

/// Collapse a transcript into persisted row pairs
pub fn pair_rows(transcript: &Transcript) -> Vec<RowPair> {
    let turns = transcript.turns();
    let mut rows = Vec::new();
    let mut i = 0;

    while i < turns.len() {
        match turns[i].role {
            Role::User => {
                let user_message = turns[i].content.clone();
                let mut assistant_response = String::new();

                if let Some(next) = turns.get(i + 1) {
                    if next.role == Role::Assistant {
                        assistant_response = next.content.clone();
                        i += 1;
                    }
                }

                let trailing_unanswered =
                    assistant_response.is_empty() && i + 1 == turns.len();
                if !trailing_unanswered {
                    rows.push(RowPair {
                        user_message,
                        assistant_response,
                    });
                }
            }
            Role::Assistant => {
                // Only an opening greeting stands alone; any later
                // assistant turn belongs to the user turn before it
                if rows.is_empty() {
                    rows.push(RowPair {
                        user_message: String::new(),
                        assistant_response: turns[i].content.clone(),
                    });
                }
            }
        }
        i += 1;
    }

    rows
}

/// Re-expand stored rows (in insertion order) into a transcript
pub fn expand_rows<'a>(rows: impl IntoIterator<Item = &'a RowPair>) -> Transcript {
    let mut transcript = Transcript::new();
    for row in rows {
        if !row.user_message.is_empty() {
            transcript.push_user(row.user_message.clone());
        }
        if !row.assistant_response.is_empty() {
            transcript.push_assistant(row.assistant_response.clone());
        }
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user: &str, assistant: &str) -> RowPair {
        RowPair {
            user_message: user.to_string(),
            assistant_response: assistant.to_string(),
        }
    }

    #[test]
    fn test_pairs_alternating_turns() {
        let mut t = Transcript::new();
        t.push_user("What's Bigin?");
        t.push_assistant("Bigin is Zoho's CRM.");
        t.push_user("Pricing?");
        t.push_assistant("Starts at $7.");

        assert_eq!(
            pair_rows(&t),
            vec![
                row("What's Bigin?", "Bigin is Zoho's CRM."),
                row("Pricing?", "Starts at $7."),
            ]
        );
    }

    #[test]
    fn test_opening_greeting_gets_own_row() {
        let mut t = Transcript::new();
        t.push_assistant("Welcome back, Priya!");
        t.push_user("Hi");
        t.push_assistant("Hello!");

        assert_eq!(
            pair_rows(&t),
            vec![row("", "Welcome back, Priya!"), row("Hi", "Hello!")]
        );
    }

    #[test]
    fn test_trailing_unanswered_user_turn_skipped() {
        let mut t = Transcript::new();
        t.push_user("Hi");
        t.push_assistant("Hello!");
        t.push_user("Still there?");

        assert_eq!(pair_rows(&t), vec![row("Hi", "Hello!")]);
    }

    #[test]
    fn test_lone_user_turn_yields_nothing() {
        let mut t = Transcript::new();
        t.push_user("Hi");
        assert!(pair_rows(&t).is_empty());
    }

    #[test]
    fn test_unanswered_user_mid_transcript_kept() {
        let mut t = Transcript::new();
        t.push_user("First");
        t.push_user("Second");
        t.push_assistant("Answer to second");

        assert_eq!(
            pair_rows(&t),
            vec![row("First", ""), row("Second", "Answer to second")]
        );
    }

    #[test]
    fn test_expand_restores_order() {
        let rows = vec![
            row("", "Welcome!"),
            row("What's Bigin?", "Bigin is Zoho's CRM."),
        ];
        let t = expand_rows(&rows);

        let contents: Vec<&str> = t.turns().iter().map(|turn| turn.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["Welcome!", "What's Bigin?", "Bigin is Zoho's CRM."]
        );
        assert_eq!(t.turns()[0].role, Role::Assistant);
        assert_eq!(t.turns()[1].role, Role::User);
    }

    #[test]
    fn test_round_trip_alternating() {
        let mut t = Transcript::new();
        t.push_assistant("Welcome!");
        t.push_user("Hi");
        t.push_assistant("Hello!");

        let rows = pair_rows(&t);
        let restored = expand_rows(&rows);
        assert_eq!(restored.turns(), t.turns());
    }
}
