//! Provider ports the rest of the vellum runtime is generic over.
//!
//! # Example
//!
//! ```ignore
//! impl ModelProvider for MyProvider {
//!     async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
//!         // call out to an upstream API and map its response into
//!         // CompletionResponse
//!         todo!()
//!     }
//! }
//! ```
//!
//! These traits return `impl Future` in argument position (RPITIT) rather
//! than boxing, so they are not object-safe: callers compose over them with
//! generics (`AgentLoop<M: ModelProvider, P: PersistenceProvider>`), never
//! `Box<dyn ModelProvider>`.

use crate::error::{MemoryError, PersistenceError, ProviderError};
use crate::types::{CompletionRequest, CompletionResponse, ConversationMessage, MemoryBlock, MemoryTier, WriteOutcome};

/// A backing LLM. Implementations adapt a concrete upstream API into the
/// shared [`CompletionRequest`] / [`CompletionResponse`] wire shape.
pub trait ModelProvider: Send + Sync {
    /// Request a completion.
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, ProviderError>> + Send;
}

/// Durable storage for conversation history.
pub trait PersistenceProvider: Send + Sync {
    /// Append a message to a conversation's history.
    fn insert_message(
        &self,
        message: ConversationMessage,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Delete a set of messages from a conversation's history, by id.
    ///
    /// Used by the compactor after a batch has been folded into a summary
    /// and archived; deletion is only issued once the archive write has
    /// durably succeeded.
    fn delete_messages(
        &self,
        conversation_id: &str,
        ids: &[String],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Load a conversation's full history, ordered by `created_at` then `id`.
    fn history(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<ConversationMessage>, PersistenceError>> + Send;
}

/// Owns the agent's memory blocks (core, working, archival tiers).
///
/// The core (agent loop, compactor) treats this as an opaque collaborator:
/// it may read freely but may only write blocks it created, via [`MemoryManager::write`].
pub trait MemoryManager: Send + Sync {
    /// Core-tier blocks, always included in the system prompt.
    fn core_blocks(&self) -> impl Future<Output = Result<Vec<MemoryBlock>, MemoryError>> + Send;

    /// Working-tier blocks for the current session.
    fn working_blocks(&self) -> impl Future<Output = Result<Vec<MemoryBlock>, MemoryError>> + Send;

    /// Render the core and working tiers into a system-prompt fragment.
    fn build_system_prompt(&self) -> impl Future<Output = Result<String, MemoryError>> + Send;

    /// Search memory blocks, optionally scoped to one tier.
    fn read(
        &self,
        query: &str,
        limit: usize,
        tier: Option<MemoryTier>,
    ) -> impl Future<Output = Result<Vec<MemoryBlock>, MemoryError>> + Send;

    /// Write or update a block. Returns a pending-mutation ticket instead of
    /// applying, when the target block is [`crate::types::MemoryPermission::Familiar`].
    fn write(
        &self,
        label: &str,
        content: &str,
        tier: Option<MemoryTier>,
        reason: Option<&str>,
    ) -> impl Future<Output = Result<WriteOutcome, MemoryError>> + Send;

    /// List blocks, optionally scoped to one tier.
    fn list(&self, tier: Option<MemoryTier>) -> impl Future<Output = Result<Vec<MemoryBlock>, MemoryError>> + Send;

    /// Delete a block by id.
    fn delete_block(&self, id: &str) -> impl Future<Output = Result<(), MemoryError>> + Send;
}
