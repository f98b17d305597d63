//! Step 2 of the compaction pipeline: partition into fixed-size chunks.

use vellum_types::ConversationMessage;

/// Partition `messages` into consecutive groups of at most `chunk_size`.
/// Only the last chunk may be smaller.
///
/// # Panics
///
/// Panics if `chunk_size` is zero.
#[must_use]
pub fn chunk_messages(messages: &[ConversationMessage], chunk_size: usize) -> Vec<Vec<ConversationMessage>> {
    assert!(chunk_size > 0, "chunk_size must be positive");
    messages.chunks(chunk_size).map(<[_]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_types::Role;

    fn msgs(n: usize) -> Vec<ConversationMessage> {
        (0..n)
            .map(|i| ConversationMessage::new("conv", Role::User, format!("m{i}")))
            .collect()
    }

    #[test]
    fn concatenation_equals_input_and_sizes_bounded() {
        let input = msgs(25);
        let chunks = chunk_messages(&input, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
        assert_eq!(chunks[2].len(), 5);
        let flat: Vec<_> = chunks.into_iter().flatten().map(|m| m.id).collect();
        let expected: Vec<_> = input.iter().map(|m| m.id.clone()).collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn only_last_chunk_may_be_smaller() {
        let input = msgs(7);
        let chunks = chunk_messages(&input, 3);
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.len(), 3);
        }
        assert!(chunks.last().unwrap().len() <= 3);
    }
}
