//! The two tool names the agent loop intercepts before dispatch.

use std::collections::HashMap;

use vellum_types::{ParamType, ToolDefinition, ToolParameter, ToolResult};

use crate::handler::ToolHandler;

/// Name of the reserved `execute_code` tool.
pub const EXECUTE_CODE: &str = "execute_code";

/// Name of the reserved `compact_context` tool.
pub const COMPACT_CONTEXT: &str = "compact_context";

/// Schema-visible definition of `execute_code`. The agent loop routes calls
/// to this name to [`vellum_sandbox::CodeExecutor`] rather than to
/// [`crate::ToolRegistry::dispatch`].
#[must_use]
pub fn execute_code_definition() -> ToolDefinition {
    ToolDefinition {
        name: EXECUTE_CODE.to_string(),
        description: "Run a short JavaScript snippet in a sandboxed subprocess with access to the \
                      registered tools via await callTool-style bridge functions."
            .to_string(),
        parameters: vec![ToolParameter::required_string("code", "the JavaScript source to execute")],
    }
}

/// Schema-visible definition of `compact_context`. The agent loop routes
/// calls to this name to the compactor rather than to
/// [`crate::ToolRegistry::dispatch`].
#[must_use]
pub fn compact_context_definition() -> ToolDefinition {
    ToolDefinition {
        name: COMPACT_CONTEXT.to_string(),
        description: "Summarize and archive older conversation history to free context budget."
            .to_string(),
        parameters: vec![],
    }
}

/// Handler installed for reserved names. Never actually invoked in a correct
/// agent loop — the loop intercepts `execute_code`/`compact_context` before
/// calling `dispatch`.
pub(crate) fn sentinel_handler() -> impl ToolHandler {
    |_params: &HashMap<String, serde_json::Value>| async {
        ToolResult::err("dispatched by the agent loop, not the tool registry")
    }
}
