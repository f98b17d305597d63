#![deny(missing_docs)]
//! Agent loop: per-message orchestration over a model provider, tool
//! registry, sandboxed code executor, memory manager, persistence layer,
//! and optional conversation compactor.

mod config;
mod loop_impl;

pub use config::LoopConfig;
pub use loop_impl::AgentLoop;
