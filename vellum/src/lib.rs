#![deny(missing_docs)]
//! # vellum — umbrella crate
//!
//! A single import surface over the vellum agent runtime. Re-exports each
//! component crate behind a feature flag, plus a `prelude` for the common
//! path: registering tools, building an [`AgentLoop`](vellum_loop::AgentLoop),
//! and driving `process_message`.

#[cfg(feature = "core")]
pub use vellum_types;

#[cfg(feature = "context")]
pub use vellum_context;

#[cfg(feature = "loop")]
pub use vellum_loop;

#[cfg(feature = "sandbox")]
pub use vellum_sandbox;

#[cfg(feature = "tool")]
pub use vellum_tool;

/// Happy-path imports for composing a vellum agent.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use vellum_types::{
        CompletionRequest, CompletionResponse, ContentBlock, ConversationMessage, MemoryBlock, MemoryManager,
        MemoryTier, MessageContent, ModelProvider, PersistenceProvider, Role, StopReason, ToolDefinition,
        ToolParameter, ToolResult,
    };

    #[cfg(feature = "tool")]
    pub use vellum_tool::ToolRegistry;

    #[cfg(feature = "context")]
    pub use vellum_context::{CompactionConfig, Compactor};

    #[cfg(feature = "sandbox")]
    pub use vellum_sandbox::{CodeExecutor, SandboxConfig};

    #[cfg(feature = "loop")]
    pub use vellum_loop::{AgentLoop, LoopConfig};
}
