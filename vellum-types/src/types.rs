//! Core message, tool, and memory-block types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A human user.
    User,
    /// An AI assistant.
    Assistant,
    /// A system message (including clip-archive messages, see `vellum-context`).
    System,
    /// A tool-result message.
    Tool,
}

/// A content item within a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    /// Plain string content.
    Text(String),
    /// Structured text blocks.
    Blocks(Vec<String>),
}

impl ToolResultContent {
    /// Flatten into a single string for token estimation and display.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            ToolResultContent::Text(s) => s.clone(),
            ToolResultContent::Blocks(parts) => parts.join("\n"),
        }
    }
}

/// A content block within a [`ConversationMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content.
    Text {
        /// The text.
        text: String,
    },
    /// A tool invocation request emitted by the model.
    ToolUse {
        /// Unique identifier for this tool call, referenced by the matching
        /// `ToolResult`.
        id: String,
        /// Name of the tool to invoke.
        name: String,
        /// String-keyed input arguments.
        input: HashMap<String, serde_json::Value>,
    },
    /// Result of a tool invocation.
    ToolResult {
        /// References the `id` from the corresponding `ToolUse`.
        tool_use_id: String,
        /// The result content.
        content: ToolResultContent,
        /// Whether this result represents an error.
        is_error: bool,
    },
}

impl ContentBlock {
    /// Construct a plain text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// The block's text, if it is a [`ContentBlock::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Message content: either a single plain string or an ordered sequence of
/// content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// A plain string body.
    Text(String),
    /// An ordered sequence of content blocks.
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Normalize to a flat list of content blocks, wrapping a plain string in
    /// a single [`ContentBlock::Text`].
    #[must_use]
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match self {
            MessageContent::Text(text) => vec![ContentBlock::text(text.clone())],
            MessageContent::Blocks(blocks) => blocks.clone(),
        }
    }

    /// Concatenate all text content (plain string, or the `Text` blocks of a
    /// block sequence).
    #[must_use]
    pub fn as_joined_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(ContentBlock::as_text)
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

/// One record per conversational turn or tool interaction.
///
/// Within a conversation, ordering by `created_at` then `id` is total and
/// monotonic with insertion (see `vellum-types` invariant tests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Unique opaque identifier, generated host-side (see [`crate::ids::new_id`]).
    pub id: String,
    /// Groups messages into a session.
    pub conversation_id: String,
    /// The message author's role.
    pub role: Role,
    /// The message content.
    pub content: MessageContent,
    /// Wall-clock timestamp; used for chronological ordering and as a
    /// tie-break key alongside `id`.
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    /// Construct a new message with a freshly generated id and `created_at = now`.
    #[must_use]
    pub fn new(conversation_id: impl Into<String>, role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            id: crate::ids::new_id(),
            conversation_id: conversation_id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Construct a message with an explicit `created_at`, for deterministic tests.
    #[must_use]
    pub fn with_timestamp(
        conversation_id: impl Into<String>,
        role: Role,
        content: impl Into<MessageContent>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: crate::ids::new_id(),
            conversation_id: conversation_id.into(),
            role,
            content: content.into(),
            created_at,
        }
    }

    /// Whether this message is a clip-archive message: `role = system` and
    /// content beginning with the clip-archive header prefix.
    #[must_use]
    pub fn is_clip_archive(&self) -> bool {
        self.role == Role::System
            && self
                .content
                .as_joined_text()
                .starts_with(crate::CLIP_ARCHIVE_PREFIX)
    }
}

/// Prefix identifying a clip-archive system message.
pub const CLIP_ARCHIVE_PREFIX: &str = "[Context Summary —";

/// A parameter type accepted by a tool definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// UTF-8 string.
    String,
    /// Numeric value.
    Number,
    /// Boolean value.
    Boolean,
    /// String-keyed map.
    Object,
    /// Ordered sequence.
    Array,
}

/// Declaration of a single tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name, unique within its tool's parameter list.
    pub name: String,
    /// The accepted type.
    pub param_type: ParamType,
    /// Human-readable description.
    pub description: String,
    /// Whether the parameter must be present on every call.
    pub required: bool,
    /// Allowed values, when the parameter is a closed string enum.
    pub enum_values: Option<Vec<String>>,
}

impl ToolParameter {
    /// Construct a required string parameter.
    #[must_use]
    pub fn required_string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: ParamType::String,
            description: description.into(),
            required: true,
            enum_values: None,
        }
    }

    /// Construct an optional parameter of the given type.
    #[must_use]
    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
            enum_values: None,
        }
    }

    /// Attach an enum constraint. Only meaningful for [`ParamType::String`]
    /// parameters — validated by `ToolRegistry::register` in `vellum-tool`.
    #[must_use]
    pub fn with_enum(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Definition of a tool, unique by `name` within a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name within the owning registry.
    pub name: String,
    /// Description surfaced to the model.
    pub description: String,
    /// Ordered parameter declarations.
    pub parameters: Vec<ToolParameter>,
}

/// The result of a tool (or sandbox, or compaction) dispatch.
///
/// Invariant: `error` is present iff `success` is `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the call succeeded.
    pub success: bool,
    /// Output text. Empty on failure.
    pub output: String,
    /// Error message. `None` iff `success` is `true`.
    pub error: Option<String>,
}

impl ToolResult {
    /// Construct a successful result.
    #[must_use]
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Construct a failed result.
    #[must_use]
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

// --- Model completion request/response ---

/// A message as sent to / received from a [`crate::ModelProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// The message role.
    pub role: Role,
    /// The message content blocks.
    pub content: Vec<ContentBlock>,
}

impl ProviderMessage {
    /// Construct a message with a single text block.
    #[must_use]
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentBlock::text(text.into())],
        }
    }
}

/// A completion request to a [`crate::ModelProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// Optional system prompt. Inline `system`-role messages in `messages`
    /// are a provider-adapter concern to merge with this field.
    pub system: Option<String>,
    /// Conversation messages.
    pub messages: Vec<ProviderMessage>,
    /// Tool definitions available to the model, in the model's own schema
    /// shape (see `ToolRegistry::to_model_tools` in `vellum-tool`).
    pub tools: Vec<serde_json::Value>,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Model reached a natural end.
    EndTurn,
    /// Model wants to use a tool.
    ToolUse,
    /// Hit the max-token limit.
    MaxTokens,
    /// Hit a stop sequence.
    StopSequence,
}

/// Token usage for a single completion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input/prompt tokens.
    pub input_tokens: usize,
    /// Output/completion tokens.
    pub output_tokens: usize,
}

/// A completion response from a [`crate::ModelProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The response content blocks.
    pub content: Vec<ContentBlock>,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Token usage.
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Concatenate the text blocks of the response.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// The `tool_use` blocks of the response, in emitted order.
    #[must_use]
    pub fn tool_uses(&self) -> Vec<(&str, &str, &HashMap<String, serde_json::Value>)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some((id.as_str(), name.as_str(), input)),
                _ => None,
            })
            .collect()
    }
}

// --- Memory blocks (collaborator-owned) ---

/// The memory tier a [`MemoryBlock`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    /// Always present in the system prompt.
    Core,
    /// Session-scoped working memory.
    Working,
    /// Searchable, not always resident — compaction batches live here.
    Archival,
}

/// Write permission on a [`MemoryBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPermission {
    /// Readable only; writes are rejected.
    Readonly,
    /// Readable and writable by its owner.
    Readwrite,
    /// Owned by a human; writes return a pending-mutation ticket instead of applying.
    Familiar,
}

/// A memory block, owned and persisted by the memory collaborator.
///
/// The core (agent loop, compactor) may only mutate blocks it created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBlock {
    /// Unique identifier.
    pub id: String,
    /// Identifier of the owning component (e.g. `"compactor"`, `"agent"`).
    pub owner: String,
    /// Memory tier.
    pub tier: MemoryTier,
    /// Human-readable label; compaction batches use
    /// `compaction-batch-{conversation_id}-{end_time_iso}`.
    pub label: String,
    /// Block content.
    pub content: String,
    /// Optional embedding vector, owned by the semantic-search collaborator.
    pub embedding: Option<Vec<f32>>,
    /// Write permission.
    pub permission: MemoryPermission,
    /// Whether this block is pinned (always included, never evicted).
    pub pinned: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// The outcome of a [`crate::MemoryManager::write`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteOutcome {
    /// Whether the write was applied immediately.
    pub applied: bool,
    /// The resulting block, if applied.
    pub block: Option<MemoryBlock>,
    /// A pending-mutation ticket id, if the target block is `Familiar` and
    /// the write requires external confirmation.
    pub mutation: Option<String>,
    /// Error detail, if the write was rejected outright.
    pub error: Option<String>,
}
