//! Input sanitation before synthesis
//!
//! Markdown emphasis, backticks and headers sound awkward when spoken;
//! arrow and dash glyphs are replaced with spoken equivalents. Input is
//! truncated to a fixed character budget so synthesis stays bounded.

use crate::config::TTS_MAX_CHARS;

/// Strip formatting that sounds awkward when spoken and truncate to the
/// synthesis character budget.
pub fn clean_for_speech(text: &str) -> String {
    let cleaned = text
        .replace("**", "")
        .replace('*', "")
        .replace('`', "")
        .replace('#', "")
        .replace('→', " to ")
        .replace('—', ", ")
        .replace("&amp;", "and")
        .replace('&', "and");

    let trimmed = cleaned.trim();
    if trimmed.chars().count() <= TTS_MAX_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().take(TTS_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markdown() {
        assert_eq!(clean_for_speech("**Bigin** is `great`"), "Bigin is great");
        assert_eq!(clean_for_speech("# Heading"), "Heading");
        assert_eq!(clean_for_speech("*emphasis*"), "emphasis");
    }

    #[test]
    fn test_spoken_glyphs() {
        assert_eq!(clean_for_speech("New → Won"), "New  to  Won");
        assert_eq!(clean_for_speech("wait — really"), "wait ,  really");
        assert_eq!(clean_for_speech("Books &amp; Inventory"), "Books and Inventory");
        assert_eq!(clean_for_speech("Books & Inventory"), "Books and Inventory");
    }

    #[test]
    fn test_truncates_to_budget() {
        let long = "a".repeat(TTS_MAX_CHARS + 500);
        assert_eq!(clean_for_speech(&long).chars().count(), TTS_MAX_CHARS);
    }

    #[test]
    fn test_whitespace_only_becomes_empty() {
        assert!(clean_for_speech("  \n ").is_empty());
        assert!(clean_for_speech("**").is_empty());
    }
}
