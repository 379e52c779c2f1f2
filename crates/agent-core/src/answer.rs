//! Final Answer Extraction
//!
//! The assistant signals completion by writing `Final Answer:` somewhere in
//! its reply. Matching is a case-insensitive substring search.

use crate::message::{Conversation, Message};

/// Completion marker, lowercase
pub const FINAL_ANSWER_MARKER: &str = "final answer:";

/// Byte offset of the marker in `text`, if present.
///
/// The marker is ASCII, so ASCII lowercasing keeps byte offsets aligned with
/// the original text.
fn marker_position(text: &str) -> Option<usize> {
    text.to_ascii_lowercase().find(FINAL_ANSWER_MARKER)
}

/// Whether `text` contains the final-answer marker
pub fn contains_marker(text: &str) -> bool {
    marker_position(text).is_some()
}

/// Text following the first marker, trimmed
pub fn strip_marker(text: &str) -> Option<&str> {
    let pos = marker_position(text)?;
    Some(text[pos + FINAL_ANSWER_MARKER.len()..].trim())
}

impl Message {
    /// Whether this message declares a final answer
    pub fn has_final_answer(&self) -> bool {
        contains_marker(&self.content)
    }
}

impl Conversation {
    /// The answer to show the caller.
    ///
    /// Newest message carrying the marker wins, with the marker and anything
    /// before it removed. Without a marker, the last message's raw text.
    pub fn final_answer(&self) -> Option<String> {
        self.messages()
            .iter()
            .rev()
            .find_map(|m| strip_marker(&m.content))
            .map(str::to_string)
            .or_else(|| self.last().map(|m| m.content.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_is_case_insensitive_substring() {
        assert!(contains_marker("FINAL ANSWER: 42"));
        assert!(contains_marker("the final answer: 42"));
        assert!(contains_marker("Thought: done.\nFinal Answer: yes"));
        assert!(!contains_marker("final answer 42"));
        assert!(!contains_marker("the answer is final"));
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("Final Answer: 4"), Some("4"));
        assert_eq!(strip_marker("Thought: easy\nFINAL ANSWER:\n  - item"), Some("- item"));
        assert_eq!(strip_marker("nothing here"), None);
    }

    #[test]
    fn test_strip_marker_after_multibyte_text() {
        assert_eq!(strip_marker("Résumé — final answer: café"), Some("café"));
    }

    #[test]
    fn test_final_answer_prefers_newest_marker() {
        let mut conv = Conversation::seeded("q");
        conv.push(Message::assistant("Final Answer: old"));
        conv.push(Message::user("follow up"));
        conv.push(Message::assistant("Final Answer: new"));
        assert_eq!(conv.final_answer().as_deref(), Some("new"));
    }

    #[test]
    fn test_final_answer_falls_back_to_last_message() {
        let mut conv = Conversation::seeded("q");
        conv.push(Message::assistant("I could not find anything."));
        assert_eq!(conv.final_answer().as_deref(), Some("I could not find anything."));
    }

    #[test]
    fn test_final_answer_marker_in_earlier_message() {
        let mut conv = Conversation::seeded("q");
        conv.push(Message::assistant("Final Answer: kept"));
        conv.push(Message::assistant("trailing note"));
        assert_eq!(conv.final_answer().as_deref(), Some("kept"));
    }

    #[test]
    fn test_final_answer_empty_conversation() {
        assert_eq!(Conversation::new().final_answer(), None);
    }
}
