//! Error enums for each boundary in the vellum runtime.

use thiserror::Error;

/// Errors returned by a [`crate::ModelProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transient network failure; safe to retry.
    #[error("network error: {0}")]
    Network(String),

    /// Rate limited by the upstream provider; safe to retry after backoff.
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Upstream timed out; safe to retry.
    #[error("request timed out")]
    Timeout,

    /// Request was malformed or rejected; not safe to retry unmodified.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Requested model does not exist.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Uncategorized provider failure.
    #[error("provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Whether the caller should retry the request unmodified.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_) | ProviderError::RateLimit(_) | ProviderError::Timeout
        )
    }
}

/// Errors returned by a tool handler or the dispatch layer in `vellum-tool`.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under the requested name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// A required parameter was missing, mistyped, or outside its enum.
    #[error("invalid input for tool {tool}: {reason}")]
    InvalidInput {
        /// Tool name.
        tool: String,
        /// Human-readable validation failure.
        reason: String,
    },

    /// The tool handler itself failed.
    #[error("tool {tool} failed: {reason}")]
    ExecutionFailed {
        /// Tool name.
        tool: String,
        /// Handler failure detail.
        reason: String,
    },

    /// Execution was cancelled before completion.
    #[error("tool {0} cancelled")]
    Cancelled(String),
}

/// Errors raised while registering a tool definition.
#[derive(Debug, Error)]
pub enum ToolRegistryError {
    /// A tool with this name is already registered.
    #[error("tool already registered: {0}")]
    DuplicateName(String),

    /// An `enum_values` constraint was attached to a non-string parameter.
    #[error("tool {tool} parameter {parameter} has enum_values but is not a string parameter")]
    InvalidEnumType {
        /// Tool name.
        tool: String,
        /// Parameter name.
        parameter: String,
    },
}

/// Errors raised by the compactor in `vellum-context`.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The summarization completion failed.
    #[error("compaction failed: {0}")]
    CompactionFailed(String),

    /// Failure delegated from the model provider.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Failure delegated from the memory manager.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Failure delegated from the persistence layer.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors raised by the sandboxed code executor in `vellum-sandbox`.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The submitted source exceeded the configured size limit.
    #[error("code size {size} exceeds limit {limit}")]
    CodeTooLarge {
        /// Submitted size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Execution exceeded the configured wall-clock timeout.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Emitted output exceeded the configured size limit and was truncated,
    /// or the limit was exceeded strictly enough to abort execution.
    #[error("output exceeded limit of {0} bytes")]
    OutputTooLarge(usize),

    /// The script made more tool calls than permitted for this execution.
    #[error("exceeded tool call quota of {0}")]
    ToolCallQuotaExceeded(usize),

    /// The script's interpreter process could not be spawned.
    #[error("failed to start interpreter: {0}")]
    SetupFailed(String),

    /// The interpreter process exited non-zero, or the IPC channel closed
    /// unexpectedly.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A tool call made from within the sandbox failed.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Errors raised by the agent loop in `vellum-loop`.
#[derive(Debug, Error)]
pub enum LoopError {
    /// Failure delegated from the model provider.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Failure delegated from the tool dispatcher.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Failure delegated from the compactor.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Failure delegated from the sandbox executor.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// Failure delegated from the persistence layer.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Failure delegated from the memory manager.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// The run was cancelled before completion.
    #[error("run cancelled")]
    Cancelled,
}

/// Errors raised by a [`crate::PersistenceProvider`].
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Underlying storage is unavailable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// No record exists under the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uncategorized storage failure.
    #[error("storage error: {0}")]
    Other(String),
}

/// Errors raised by a [`crate::MemoryManager`].
#[derive(Debug, Error)]
pub enum MemoryError {
    /// No block exists under the requested id.
    #[error("memory block not found: {0}")]
    NotFound(String),

    /// The caller attempted to mutate a block it does not own, or a
    /// `readonly` block.
    #[error("permission denied writing block {0}")]
    PermissionDenied(String),

    /// Uncategorized memory-store failure.
    #[error("memory error: {0}")]
    Other(String),
}
