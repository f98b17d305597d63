//! Executor tuning knobs and result/context shapes.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::CodeExecutor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// The interpreter executable to spawn, e.g. `"node"`.
    pub interpreter: String,
    /// Arguments passed before the assembled script, e.g. `["-e"]` so the
    /// script is delivered as a single `argv` entry rather than over stdin —
    /// stdin is reserved for the bridge's bidirectional tool-call IPC for
    /// the lifetime of the child process (see `DESIGN.md`).
    pub interpreter_args: Vec<String>,
    /// Reject code whose length in bytes exceeds this.
    pub max_code_size: usize,
    /// Abort execution once accumulated child output would exceed this many bytes.
    pub max_output_size: usize,
    /// Total wall-clock budget for one execution.
    pub code_timeout: Duration,
    /// Maximum number of tool calls the sandboxed code may make.
    pub max_tool_calls_per_exec: usize,
    /// Working directory the child process is spawned in; also the sole
    /// directory it may write to.
    pub working_dir: PathBuf,
    /// Allowlisted network hosts.
    pub allowed_hosts: Vec<String>,
    /// Additional read-only paths beyond `working_dir`.
    pub allowed_read_paths: Vec<PathBuf>,
    /// Executable names the sandbox may spawn as subprocesses.
    pub allowed_run: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: "node".to_string(),
            interpreter_args: vec!["-e".to_string()],
            max_code_size: 51_200,
            max_output_size: 1_048_576,
            code_timeout: Duration::from_millis(60_000),
            max_tool_calls_per_exec: 25,
            working_dir: PathBuf::from("."),
            allowed_hosts: Vec::new(),
            allowed_read_paths: Vec::new(),
            allowed_run: Vec::new(),
        }
    }
}

/// Optional per-execution context: credential constants and network allowlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Bluesky credentials, when the calling agent has an active session.
    pub bluesky: Option<BlueskyContext>,
}

/// Bluesky (AT Protocol) credentials threaded into the sandbox as
/// `BSKY_*` constants and, via `pds_url`'s host, an additional network
/// allowlist entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyContext {
    /// The user's Personal Data Server URL.
    pub pds_url: String,
    /// The user's handle, e.g. `alice.bsky.social`.
    pub handle: String,
    /// An app password (never the account password).
    pub app_password: String,
    /// The user's DID.
    pub did: String,
    /// The DID of the PDS's backing service, if known.
    pub service_did: String,
}

/// Outcome of a [`crate::CodeExecutor::execute`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether execution completed without tripping a host-side quota or timeout.
    pub success: bool,
    /// Accumulated output emitted via `output(...)`.
    pub output: String,
    /// Set iff `success` is `false`.
    pub error: Option<String>,
    /// Number of `__tool_call__` messages received from the sandbox.
    pub tool_calls_made: usize,
    /// Wall-clock duration of the execution.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Construct a failed result with zero tool calls made and zero duration,
    /// for pre-flight rejections that never spawned a subprocess.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            tool_calls_made: 0,
            duration_ms: 0,
        }
    }
}
