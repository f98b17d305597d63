//! Package-level prompt constants: global prompts live here as package-level
//! constants rather than mutable state on the compactor.

/// Default system prompt for per-chunk summarization completions.
pub const DEFAULT_SUMMARIZATION_SYSTEM_PROMPT: &str = "You are summarizing part of a long-running \
conversation between a user and an AI assistant. Produce a concise, faithful summary that preserves \
facts, decisions, and open threads a later reader would need. Do not editorialize.";

/// Directive appended as the final user message of each fold-in
/// summarization call.
pub const CHUNK_DIRECTIVE: &str = "Summarize the conversation above, folding in the prior cumulative \
summary if one was given. Respond with the updated summary only.";

/// Directive appended as the final user message of a re-summarization call.
pub const RESUMMARIZE_DIRECTIVE: &str = "Summarize the batch summaries above into a single combined \
summary that preserves every fact and decision they collectively record. Respond with the combined \
summary only.";

/// Fixed small buffer added to `clip_first + clip_last` to decide when
/// re-summarization triggers.
pub const RESUMMARIZE_BUFFER: usize = 2;
