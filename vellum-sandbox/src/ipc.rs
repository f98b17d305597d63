//! Newline-delimited JSON wire format between host and sandbox.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vellum_types::ToolResult;

/// A message emitted by the sandboxed child process, one per stdout line.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ChildMessage {
    /// A tool invocation request from sandboxed code.
    #[serde(rename = "__tool_call__")]
    ToolCall {
        /// Tool name.
        name: String,
        /// Call parameters.
        params: HashMap<String, serde_json::Value>,
        /// Unique id this call is keyed by; echoed back in the matching response.
        call_id: String,
    },
    /// Output emitted via the bridge's `output(...)` function.
    #[serde(rename = "__output__")]
    Output {
        /// The emitted data.
        data: String,
    },
    /// A debug line emitted via the bridge's `debug(...)` function. Does not
    /// count against the output quota.
    #[serde(rename = "__debug__")]
    Debug {
        /// The debug message.
        message: String,
    },
    /// Emitted once by `__signalDone__()` when the wrapped user code settles
    /// (resolves, throws, or returns early). The host treats this as the
    /// execution-complete signal rather than waiting on stdout EOF, since the
    /// bridge's stdin `readline` interface would otherwise keep the child's
    /// event loop alive indefinitely.
    #[serde(rename = "__done__")]
    Done,
}

/// A message written by the host to the child's stdin, one per line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    /// The result of a dispatched tool call.
    #[serde(rename = "__tool_result__")]
    ToolResult {
        /// Echoes the originating call's id.
        call_id: String,
        /// The dispatch result.
        result: ToolResult,
    },
    /// Signals that a tool call could not be serviced (unknown reserved name,
    /// or the tool-call quota was exceeded).
    #[serde(rename = "__tool_error__")]
    ToolError {
        /// Echoes the originating call's id.
        call_id: String,
        /// Human-readable failure reason.
        error: String,
    },
}

impl HostMessage {
    /// Serialize to a single newline-terminated JSON line.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            // Serialization of our own well-typed enum cannot fail in
            // practice; fall back to a minimal error envelope rather than
            // panicking the host IPC loop.
            format!(r#"{{"type":"__tool_error__","call_id":"","error":"serialize failure: {e}"}}"#)
        });
        line.push('\n');
        line
    }
}
