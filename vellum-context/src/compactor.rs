//! The compaction pipeline: split, chunk, fold-in summarize, archive,
//! delete source messages, rebuild the clip-archive, recursively
//! re-summarize when the clip window overflows.

use chrono::Utc;
use vellum_types::{
    CompletionRequest, ContentBlock, ContextError, ConversationMessage, MemoryManager, MemoryTier, ModelProvider,
    PersistenceProvider, ProviderMessage, Role,
};

use crate::batch::{SummaryBatch, BATCH_LABEL_PREFIX};
use crate::chunk::chunk_messages;
use crate::clip::build_clip_archive;
use crate::config::{CompactionConfig, CompactionResult};
use crate::counter::TokenCounter;
use crate::prompts::{CHUNK_DIRECTIVE, DEFAULT_SUMMARIZATION_SYSTEM_PROMPT, RESUMMARIZE_BUFFER, RESUMMARIZE_DIRECTIVE};
use crate::split::split_history;

struct ArchivedBatch {
    id: String,
    batch: SummaryBatch,
}

/// Summarizes, archives, and clips old conversation history.
///
/// Generic over the three collaborator ports, composed over traits rather
/// than trait objects since they're RPITIT and not object-safe. Owns no
/// transport of its own; `compress` never panics and never propagates an
/// error past its own boundary — any internal failure is logged and answered
/// with a no-op result.
pub struct Compactor<M, Mem, P> {
    provider: M,
    memory: Mem,
    persistence: P,
    model: String,
    config: CompactionConfig,
    counter: TokenCounter,
}

impl<M, Mem, P> Compactor<M, Mem, P>
where
    M: ModelProvider,
    Mem: MemoryManager,
    P: PersistenceProvider,
{
    /// Construct a compactor. `model` is the model identifier sent on every
    /// summarization [`CompletionRequest`].
    pub fn new(provider: M, memory: Mem, persistence: P, model: impl Into<String>, config: CompactionConfig) -> Self {
        Self {
            provider,
            memory,
            persistence,
            model: model.into(),
            config,
            counter: TokenCounter::new(),
        }
    }

    /// Compress `history` if there is anything beyond `keep_recent` to fold
    /// away. Never fails: internal errors are logged and answered with the
    /// original history unchanged.
    pub async fn compress(&self, history: &[ConversationMessage], conversation_id: &str) -> CompactionResult {
        let before = self.counter.estimate_messages(history);
        match self.try_compress(history, conversation_id, before).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(conversation_id, %error, "compaction failed, returning original history");
                CompactionResult::no_op(history.to_vec(), before)
            }
        }
    }

    async fn try_compress(
        &self,
        history: &[ConversationMessage],
        conversation_id: &str,
        before: usize,
    ) -> Result<CompactionResult, ContextError> {
        let split = split_history(history, self.config.keep_recent);
        if split.to_compress.is_empty() {
            return Ok(CompactionResult::no_op(history.to_vec(), before));
        }

        let chunks = chunk_messages(&split.to_compress, self.config.chunk_size);
        let mut accumulator = split.prior_summary.clone().unwrap_or_default();
        let mut new_batches = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            let start_time = chunk.first().expect("chunks are non-empty").created_at;
            let end_time = chunk.last().expect("chunks are non-empty").created_at;
            let summary_text = self.summarize_chunk(&accumulator, chunk).await?;
            new_batches.push(SummaryBatch {
                content: summary_text.clone(),
                depth: 0,
                start_time,
                end_time,
                message_count: chunk.len(),
            });
            accumulator = summary_text;
        }

        let mut archived_new = Vec::with_capacity(new_batches.len());
        for batch in new_batches {
            archived_new.push(self.archive_batch(conversation_id, batch).await?);
        }
        let batches_created = archived_new.len();

        let messages_compressed = split.to_compress.len();
        let ids: Vec<String> = split.to_compress.iter().map(|m| m.id.clone()).collect();
        self.persistence.delete_messages(conversation_id, &ids).await?;

        let mut all_batches = self.load_existing_batches(conversation_id).await?;
        all_batches.extend(archived_new);
        all_batches.sort_by_key(|a| a.batch.end_time);

        if all_batches.len() > self.config.clip_first + self.config.clip_last + RESUMMARIZE_BUFFER {
            all_batches = self.resummarize_batches(conversation_id, all_batches).await?;
        }

        let batch_refs: Vec<SummaryBatch> = all_batches.iter().map(|a| a.batch.clone()).collect();
        let clip_content = build_clip_archive(&batch_refs, messages_compressed, self.config.clip_first, self.config.clip_last);

        // created_at = now; the returned `history` order below (not a
        // created_at re-sort) is authoritative until delete+insert here
        // commit as a single unit.
        let clip_message = ConversationMessage::with_timestamp(conversation_id, Role::System, clip_content, Utc::now());
        self.persistence.insert_message(clip_message.clone()).await?;

        let mut result_history = Vec::with_capacity(1 + split.to_keep.len());
        result_history.push(clip_message);
        result_history.extend(split.to_keep);

        let after = self.counter.estimate_messages(&result_history);

        Ok(CompactionResult {
            history: result_history,
            batches_created,
            messages_compressed,
            tokens_estimate_before: before,
            tokens_estimate_after: after,
        })
    }

    async fn summarize_chunk(&self, accumulator: &str, chunk: &[ConversationMessage]) -> Result<String, ContextError> {
        let mut messages = Vec::new();
        if !accumulator.is_empty() {
            messages.push(ProviderMessage {
                role: Role::System,
                content: vec![ContentBlock::text(accumulator.to_string())],
            });
        }
        for message in chunk {
            if let Some(provider_message) = message_to_provider(message) {
                messages.push(provider_message);
            }
        }
        messages.push(ProviderMessage {
            role: Role::User,
            content: vec![ContentBlock::text(CHUNK_DIRECTIVE)],
        });

        let request = CompletionRequest {
            model: self.model.clone(),
            system: Some(self.summarization_prompt()),
            messages,
            tools: vec![],
            max_tokens: self.config.max_summary_tokens,
            temperature: Some(0.0),
        };

        let response = self.provider.complete(request).await?;
        Ok(response.text())
    }

    async fn resummarize(&self, batches: &[SummaryBatch]) -> Result<String, ContextError> {
        let mut messages: Vec<ProviderMessage> = batches
            .iter()
            .map(|batch| ProviderMessage {
                role: Role::System,
                content: vec![ContentBlock::text(batch.content.clone())],
            })
            .collect();
        messages.push(ProviderMessage {
            role: Role::User,
            content: vec![ContentBlock::text(RESUMMARIZE_DIRECTIVE)],
        });

        let request = CompletionRequest {
            model: self.model.clone(),
            system: Some(self.summarization_prompt()),
            messages,
            tools: vec![],
            max_tokens: self.config.max_summary_tokens,
            temperature: Some(0.0),
        };

        let response = self.provider.complete(request).await?;
        Ok(response.text())
    }

    async fn archive_batch(&self, conversation_id: &str, batch: SummaryBatch) -> Result<ArchivedBatch, ContextError> {
        let label = batch.label(conversation_id);
        let content = batch.to_archival_content();
        let outcome = self.memory.write(&label, &content, Some(MemoryTier::Archival), None).await?;
        let block = outcome
            .block
            .filter(|_| outcome.applied)
            .ok_or_else(|| ContextError::CompactionFailed(format!("archive write for {label} did not apply")))?;
        Ok(ArchivedBatch { id: block.id, batch })
    }

    async fn load_existing_batches(&self, conversation_id: &str) -> Result<Vec<ArchivedBatch>, ContextError> {
        let prefix = format!("{BATCH_LABEL_PREFIX}{conversation_id}-");
        let blocks = self.memory.list(Some(MemoryTier::Archival)).await?;
        Ok(blocks
            .into_iter()
            .filter(|block| block.label.starts_with(&prefix))
            .filter_map(|block| {
                SummaryBatch::parse_archival_content(&block.content).map(|batch| ArchivedBatch { id: block.id, batch })
            })
            .collect())
    }

    /// Re-summarize the middle band of the clip window.
    /// Idempotent: a call with nothing past the clip-first/clip-last window
    /// is a no-op.
    async fn resummarize_batches(
        &self,
        conversation_id: &str,
        batches: Vec<ArchivedBatch>,
    ) -> Result<Vec<ArchivedBatch>, ContextError> {
        let total = batches.len();
        if total <= self.config.clip_first + self.config.clip_last {
            return Ok(batches);
        }
        let middle_start = self.config.clip_first;
        let middle_end = total - self.config.clip_last;
        if middle_start >= middle_end {
            return Ok(batches);
        }

        let middle_refs: Vec<SummaryBatch> = batches[middle_start..middle_end].iter().map(|a| a.batch.clone()).collect();
        let summary_text = self.resummarize(&middle_refs).await?;

        let new_depth = middle_refs.iter().map(|b| b.depth).max().unwrap_or(0) + 1;
        let new_start = middle_refs.iter().map(|b| b.start_time).min().expect("non-empty middle band");
        let new_end = middle_refs.iter().map(|b| b.end_time).max().expect("non-empty middle band");
        let new_count = middle_refs.iter().map(|b| b.message_count).sum();

        let new_batch = SummaryBatch {
            content: summary_text,
            depth: new_depth,
            start_time: new_start,
            end_time: new_end,
            message_count: new_count,
        };
        let archived_new = self.archive_batch(conversation_id, new_batch).await?;

        for superseded in &batches[middle_start..middle_end] {
            self.memory.delete_block(&superseded.id).await?;
        }

        let mut result = Vec::with_capacity(total - (middle_end - middle_start) + 1);
        result.extend(batches[..middle_start].iter().map(|a| ArchivedBatch {
            id: a.id.clone(),
            batch: a.batch.clone(),
        }));
        result.push(archived_new);
        result.extend(batches[middle_end..].iter().map(|a| ArchivedBatch {
            id: a.id.clone(),
            batch: a.batch.clone(),
        }));
        Ok(result)
    }

    fn summarization_prompt(&self) -> String {
        self.config
            .prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SUMMARIZATION_SYSTEM_PROMPT.to_string())
    }
}

fn message_to_provider(message: &ConversationMessage) -> Option<ProviderMessage> {
    match message.role {
        Role::System => None,
        Role::Tool => Some(ProviderMessage {
            role: Role::User,
            content: vec![ContentBlock::text(format!("[Tool result]: {}", message.content.as_joined_text()))],
        }),
        Role::User | Role::Assistant => Some(ProviderMessage {
            role: message.role,
            content: message.content.blocks(),
        }),
    }
}
