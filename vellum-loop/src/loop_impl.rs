//! The agent loop: per-message orchestration.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use vellum_context::{CompactionConfig, CompactionResult, Compactor, TokenCounter};
use vellum_sandbox::{CodeExecutor, ExecutionContext};
use vellum_tool::{ToolRegistry, COMPACT_CONTEXT, EXECUTE_CODE};
use vellum_types::{
    CompletionRequest, ContentBlock, ConversationMessage, LoopError, MemoryManager, MessageContent, ModelProvider,
    PersistenceProvider, ProviderMessage, Role, StopReason, ToolResultContent,
};

use crate::config::LoopConfig;

/// Drives one conversation: persists turns, builds model context, consults
/// the compactor when the token budget is tight, and dispatches tool/code
/// calls until the model returns a final answer.
///
/// Generic over the three collaborator ports, composed over RPITIT traits
/// rather than `Box<dyn ..>` since they aren't object-safe. `M`, `Mem`, and `P`
/// must additionally be `Clone` so the loop and its optional [`Compactor`]
/// can each hold their own handle to the same backing provider/store — most
/// real adapters are thin wrappers around an `Arc<Client>` and are cheap to
/// clone for exactly this reason.
pub struct AgentLoop<M, Mem, P> {
    conversation_id: String,
    model: M,
    memory: Mem,
    persistence: P,
    registry: Arc<ToolRegistry>,
    executor: CodeExecutor,
    compactor: Option<Compactor<M, Mem, P>>,
    config: LoopConfig,
}

impl<M, Mem, P> AgentLoop<M, Mem, P>
where
    M: ModelProvider + Clone,
    Mem: MemoryManager + Clone,
    P: PersistenceProvider + Clone,
{
    /// Construct an agent loop for one conversation. `compaction` being
    /// `Some` wires up a [`Compactor`] sharing clones of `model`, `memory`,
    /// and `persistence`; `None` is the skip-compression policy — the
    /// budget check in [`AgentLoop::process_message`] then never compacts.
    pub fn new(
        conversation_id: impl Into<String>,
        model: M,
        memory: Mem,
        persistence: P,
        registry: Arc<ToolRegistry>,
        executor: CodeExecutor,
        compaction: Option<CompactionConfig>,
        config: LoopConfig,
    ) -> Self {
        let compactor = compaction.map(|compaction_config| {
            Compactor::new(
                model.clone(),
                memory.clone(),
                persistence.clone(),
                config.model.clone(),
                compaction_config,
            )
        });
        Self {
            conversation_id: conversation_id.into(),
            model,
            memory,
            persistence,
            registry,
            executor,
            compactor,
            config,
        }
    }

    /// The loop's configuration.
    #[must_use]
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// The conversation this loop drives.
    #[must_use]
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Process one user message to completion.
    ///
    /// Persists the user turn, builds the model request, compacts history
    /// if the budget check trips and a compactor is configured, then runs
    /// bounded tool rounds until the model reaches a terminal stop reason.
    /// Returns the final assistant text.
    ///
    /// If `config.max_tool_rounds` is hit before a terminal stop reason, the
    /// loop does not error: it returns whatever assistant text the last
    /// round produced. A partial answer is preferable to an unbounded loop
    /// (spec §4.4 invariants), and that last assistant message has already
    /// been persisted.
    ///
    /// # Errors
    ///
    /// `LoopError::Cancelled` if `cancellation_token` fires, or a delegated
    /// provider/tool/persistence error — these are the one place `process_message`
    /// does propagate a hard failure rather than swallowing it.
    pub async fn process_message(
        &self,
        user_text: impl Into<String>,
        execution_context: Option<&ExecutionContext>,
        cancellation_token: &CancellationToken,
    ) -> Result<String, LoopError> {
        let user_message = ConversationMessage::new(&self.conversation_id, Role::User, user_text.into());
        self.persistence.insert_message(user_message).await?;

        let mut history = self.persistence.history(&self.conversation_id).await?;
        history = self.maybe_compact(history).await;

        let system_prompt = self.memory.build_system_prompt().await?;
        let mut messages = self.build_messages(&history).await?;

        let mut rounds = 0usize;
        let mut last_assistant_text = String::new();
        loop {
            if cancellation_token.is_cancelled() {
                return Err(LoopError::Cancelled);
            }
            if rounds >= self.config.max_tool_rounds {
                tracing::warn!(
                    conversation_id = %self.conversation_id,
                    max_tool_rounds = self.config.max_tool_rounds,
                    "max tool rounds exceeded, returning partial answer"
                );
                return Ok(last_assistant_text);
            }

            let request = CompletionRequest {
                model: self.config.model.clone(),
                system: Some(system_prompt.clone()),
                messages: messages.clone(),
                tools: self.registry.to_model_tools(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };

            let response = self.model.complete(request).await?;
            rounds += 1;
            last_assistant_text = response.text();

            let assistant_message = ConversationMessage::new(
                &self.conversation_id,
                Role::Assistant,
                MessageContent::Blocks(response.content.clone()),
            );
            self.persistence.insert_message(assistant_message).await?;
            messages.push(ProviderMessage {
                role: Role::Assistant,
                content: response.content.clone(),
            });

            if response.stop_reason != StopReason::ToolUse {
                return Ok(response.text());
            }

            let tool_uses: Vec<(String, String, HashMap<String, serde_json::Value>)> = response
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();

            let mut compacted_mid_round = false;
            let mut result_blocks = Vec::with_capacity(tool_uses.len());
            for (id, name, input) in &tool_uses {
                if name == COMPACT_CONTEXT {
                    let summary = self.run_compact_context_tool().await;
                    result_blocks.push(ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: ToolResultContent::Text(summary),
                        is_error: false,
                    });
                    compacted_mid_round = true;
                } else if name == EXECUTE_CODE {
                    result_blocks.push(self.run_execute_code_tool(id, input, execution_context, cancellation_token).await);
                } else {
                    let result = self.registry.dispatch(name, input).await;
                    result_blocks.push(ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: ToolResultContent::Text(if result.success {
                            result.output
                        } else {
                            result.error.unwrap_or_default()
                        }),
                        is_error: !result.success,
                    });
                }
            }

            let tool_message = ConversationMessage::new(
                &self.conversation_id,
                Role::Tool,
                MessageContent::Blocks(result_blocks.clone()),
            );
            self.persistence.insert_message(tool_message).await?;

            if compacted_mid_round {
                // The compactor has rewritten persisted history (old messages
                // deleted, a clip-archive inserted); the running `messages`
                // tally reflects state predating that rewrite, so rebuild it
                // from persistence rather than appending on top of it.
                let history = self.persistence.history(&self.conversation_id).await?;
                messages = self.build_messages(&history).await?;
            } else {
                messages.push(ProviderMessage {
                    role: Role::User,
                    content: result_blocks,
                });
            }
        }
    }

    async fn maybe_compact(&self, history: Vec<ConversationMessage>) -> Vec<ConversationMessage> {
        let Some(compactor) = &self.compactor else {
            return history;
        };
        let estimate = TokenCounter::new().estimate_messages(&history);
        let budget = (self.config.context_budget * self.config.model_max_tokens as f64) as usize;
        if estimate <= budget {
            return history;
        }
        let result = compactor.compress(&history, &self.conversation_id).await;
        result.history
    }

    async fn run_compact_context_tool(&self) -> String {
        let Some(compactor) = &self.compactor else {
            return NoOpCompactionSummary::default().to_json();
        };
        let history = match self.persistence.history(&self.conversation_id).await {
            Ok(history) => history,
            Err(error) => {
                tracing::warn!(%error, "compact_context: failed to load history, treating as no-op");
                return NoOpCompactionSummary::default().to_json();
            }
        };
        let result = compactor.compress(&history, &self.conversation_id).await;
        CompactionSummary::from(&result).to_json()
    }

    async fn run_execute_code_tool(
        &self,
        id: &str,
        input: &HashMap<String, serde_json::Value>,
        execution_context: Option<&ExecutionContext>,
        cancellation_token: &CancellationToken,
    ) -> ContentBlock {
        let code = input.get("code").and_then(serde_json::Value::as_str).unwrap_or_default();
        let stubs = self.registry.generate_stubs();
        let result = self
            .executor
            .execute(code, &stubs, &self.registry, execution_context, cancellation_token)
            .await;
        let is_error = !result.success;
        let content = if result.success {
            result.output
        } else {
            result.error.unwrap_or_default()
        };
        ContentBlock::ToolResult {
            tool_use_id: id.to_string(),
            content: ToolResultContent::Text(content),
            is_error,
        }
    }

    async fn build_messages(&self, history: &[ConversationMessage]) -> Result<Vec<ProviderMessage>, LoopError> {
        let working_blocks = self.memory.working_blocks().await?;
        let mut messages: Vec<ProviderMessage> = working_blocks
            .iter()
            .map(|block| ProviderMessage {
                role: Role::System,
                content: vec![ContentBlock::text(format!("[Working Memory: {}]\n{}", block.label, block.content))],
            })
            .collect();
        messages.extend(history.iter().map(history_message_to_provider));
        Ok(messages)
    }
}

fn history_message_to_provider(message: &ConversationMessage) -> ProviderMessage {
    // Role::Tool history is persisted separately from Role::User/Assistant so
    // it is visible as its own kind in storage, but providers expect tool
    // results folded into a user turn, mirroring `vellum_context`'s fold-in
    // summarization message mapping.
    let role = if message.role == Role::Tool { Role::User } else { message.role };
    ProviderMessage {
        role,
        content: message.content.blocks(),
    }
}

/// JSON-serializable projection of a [`CompactionResult`] for the
/// `compact_context` tool's result content — `CompactionResult` itself
/// isn't `Serialize` since its `history` is an implementation detail the
/// tool-result surface doesn't need to expose.
#[derive(Debug, Serialize)]
struct CompactionSummary {
    batches_created: usize,
    messages_compressed: usize,
    tokens_estimate_before: usize,
    tokens_estimate_after: usize,
}

impl From<&CompactionResult> for CompactionSummary {
    fn from(result: &CompactionResult) -> Self {
        Self {
            batches_created: result.batches_created,
            messages_compressed: result.messages_compressed,
            tokens_estimate_before: result.tokens_estimate_before,
            tokens_estimate_after: result.tokens_estimate_after,
        }
    }
}

impl CompactionSummary {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Default, Serialize)]
struct NoOpCompactionSummary {
    batches_created: usize,
    messages_compressed: usize,
}

impl NoOpCompactionSummary {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
