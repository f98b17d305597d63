//! Step 1 of the compaction pipeline: split history into a prior summary,
//! the band to compress, and the band to keep verbatim.

use vellum_types::ConversationMessage;

/// Result of [`split_history`].
pub struct SplitHistory {
    /// Text of a leading clip-archive message, if present.
    pub prior_summary: Option<String>,
    /// Oldest messages, to be folded into new summary batches. Empty when
    /// there is nothing to compress.
    pub to_compress: Vec<ConversationMessage>,
    /// Newest `keep_recent` messages, left untouched.
    pub to_keep: Vec<ConversationMessage>,
}

/// Split `history` into `(prior_summary, to_compress, to_keep)`.
///
/// `to_compress` is empty iff there was nothing to compress (history already
/// fits within `keep_recent`), signaling a no-op to the caller.
#[must_use]
pub fn split_history(history: &[ConversationMessage], keep_recent: usize) -> SplitHistory {
    let (prior_summary, remainder) = match history.first() {
        Some(first) if first.is_clip_archive() => (
            Some(first.content.as_joined_text()),
            &history[1..],
        ),
        _ => (None, history),
    };

    if remainder.len() <= keep_recent {
        return SplitHistory {
            prior_summary,
            to_compress: Vec::new(),
            to_keep: remainder.to_vec(),
        };
    }

    let split_at = remainder.len() - keep_recent;
    SplitHistory {
        prior_summary,
        to_compress: remainder[..split_at].to_vec(),
        to_keep: remainder[split_at..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vellum_types::Role;

    fn msg(text: &str) -> ConversationMessage {
        ConversationMessage::new("conv", Role::User, text)
    }

    #[test]
    fn partitions_lengths_sum_to_input() {
        let history: Vec<_> = (0..10).map(|i| msg(&format!("m{i}"))).collect();
        let split = split_history(&history, 3);
        assert_eq!(split.to_compress.len() + split.to_keep.len(), history.len());
        assert_eq!(split.to_keep.len(), 3);
    }

    #[test]
    fn to_compress_precedes_to_keep_by_created_at() {
        let history: Vec<_> = (0..10).map(|i| msg(&format!("m{i}"))).collect();
        let split = split_history(&history, 3);
        let max_compress = split.to_compress.iter().map(|m| m.created_at).max();
        let min_keep = split.to_keep.iter().map(|m| m.created_at).min();
        if let (Some(a), Some(b)) = (max_compress, min_keep) {
            assert!(a <= b);
        }
    }

    #[test]
    fn no_op_when_history_fits_in_keep_recent() {
        let history: Vec<_> = (0..3).map(|i| msg(&format!("m{i}"))).collect();
        let split = split_history(&history, 5);
        assert!(split.to_compress.is_empty());
        assert_eq!(split.to_keep.len(), 3);
    }

    #[test]
    fn extracts_leading_clip_archive_as_prior_summary() {
        let mut history = vec![ConversationMessage::with_timestamp(
            "conv",
            Role::System,
            format!("{} some prior text", vellum_types::CLIP_ARCHIVE_PREFIX),
            Utc::now(),
        )];
        history.extend((0..5).map(|i| msg(&format!("m{i}"))));
        let split = split_history(&history, 2);
        assert!(split.prior_summary.is_some());
        assert_eq!(split.to_compress.len() + split.to_keep.len(), 5);
    }
}
