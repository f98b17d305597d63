//! Agent loop tuning knobs.

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::AgentLoop`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Model identifier sent on every [`vellum_types::CompletionRequest`].
    pub model: String,
    /// The model's context window, used for the budget check
    /// (`estimated_tokens > context_budget * model_max_tokens`).
    pub model_max_tokens: usize,
    /// `max_tokens` passed on every completion request (the generation cap,
    /// distinct from `model_max_tokens`, the context window).
    pub max_tokens: usize,
    /// Sampling temperature for completion requests.
    pub temperature: Option<f32>,
    /// Maximum tool rounds per `process_message` call before the loop gives
    /// up and returns the last assistant text as a partial answer.
    pub max_tool_rounds: usize,
    /// Fraction of `model_max_tokens` that triggers compaction when crossed.
    pub context_budget: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            model_max_tokens: 200_000,
            max_tokens: 4096,
            temperature: None,
            max_tool_rounds: 20,
            context_budget: 0.8,
        }
    }
}
