//! Compaction tuning knobs.

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::Compactor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Number of source messages folded into each summarization call.
    pub chunk_size: usize,
    /// Number of most-recent messages left uncompressed.
    pub keep_recent: usize,
    /// `max_tokens` passed to the summarization completion request.
    pub max_summary_tokens: usize,
    /// Number of earliest batches always shown in the clip-archive.
    pub clip_first: usize,
    /// Number of most-recent batches always shown in the clip-archive.
    pub clip_last: usize,
    /// Override for the summarization system prompt. `None` uses
    /// [`crate::prompts::DEFAULT_SUMMARIZATION_SYSTEM_PROMPT`].
    pub prompt: Option<String>,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            chunk_size: 20,
            keep_recent: 5,
            max_summary_tokens: 1024,
            clip_first: 2,
            clip_last: 2,
            prompt: None,
        }
    }
}

/// Outcome of a [`crate::Compactor::compress`] call.
#[derive(Debug, Clone)]
pub struct CompactionResult {
    /// The (possibly unchanged) compressed history.
    pub history: Vec<vellum_types::ConversationMessage>,
    /// Number of new summary batches produced by this call.
    pub batches_created: usize,
    /// Number of source messages folded away by this call.
    pub messages_compressed: usize,
    /// Token estimate over the input history.
    pub tokens_estimate_before: usize,
    /// Token estimate over the returned history.
    pub tokens_estimate_after: usize,
}

impl CompactionResult {
    pub(crate) fn no_op(history: Vec<vellum_types::ConversationMessage>, estimate: usize) -> Self {
        Self {
            history,
            batches_created: 0,
            messages_compressed: 0,
            tokens_estimate_before: estimate,
            tokens_estimate_after: estimate,
        }
    }
}
