//! Token estimation.

use vellum_types::ConversationMessage;

/// Character-count-based token estimate: `ceil(chars / 4)`.
///
/// Deliberately simpler than a per-content-type weighting heuristic: the
/// estimate is fixed at `ceil(totalCharacters/4)` so the budget check in
/// `vellum-loop` and the compactor agree on the same number.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter;

impl TokenCounter {
    /// Create a counter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Estimate the tokens in a single string. `estimate_text("") == 0`.
    #[must_use]
    pub fn estimate_text(&self, text: &str) -> usize {
        (text.chars().count() as f64 / 4.0).ceil() as usize
    }

    /// Estimate the tokens across a full message history.
    #[must_use]
    pub fn estimate_messages(&self, messages: &[ConversationMessage]) -> usize {
        messages
            .iter()
            .map(|m| self.estimate_text(&m.content.as_joined_text()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero_tokens() {
        assert_eq!(TokenCounter::new().estimate_text(""), 0);
    }

    #[test]
    fn rounds_up() {
        let counter = TokenCounter::new();
        assert_eq!(counter.estimate_text("abcd"), 1);
        assert_eq!(counter.estimate_text("abcde"), 2);
        assert_eq!(counter.estimate_text("abcdefgh"), 2);
    }
}
