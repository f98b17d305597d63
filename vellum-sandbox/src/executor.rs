//! The sandboxed code executor: spawns the interpreter, assembles the
//! bridge + stubs + user script, and drives the host side of the IPC loop —
//! dispatching sandbox tool calls through a [`ToolRegistry`], enforcing
//! output/tool-call quotas and the wall-clock timeout.
//!
//! The loop's natural end is the child's `__done__` message (emitted by the
//! bridge once the wrapped user code settles), not stdout EOF: the bridge's
//! stdin `readline` interface keeps the child's event loop alive, so a
//! successful run that waited for process exit would never terminate short
//! of `code_timeout`. Any dispatches still in flight when `__done__` arrives
//! are drained before the child is killed. The child's stderr is reflected
//! verbatim into the returned output, uncounted against the output quota, so
//! permission denials and other diagnostics on that stream reach the caller.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vellum_tool::ToolRegistry;

use crate::config::{ExecutionContext, ExecutionResult, SandboxConfig};
use crate::ipc::{ChildMessage, HostMessage};
use crate::permissions::{build_permission_grid, PERMISSIONS_ENV_VAR};
use crate::script::assemble_script;

/// Spawns a sandboxed interpreter per [`SandboxConfig`] and runs the host
/// side of the bridge IPC loop.
///
/// Holds no state between invocations other than its configuration.
pub struct CodeExecutor {
    config: SandboxConfig,
}

impl CodeExecutor {
    /// Construct an executor with the given configuration.
    #[must_use]
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// The executor's configuration.
    #[must_use]
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run `code` in the sandbox, with `tool_stubs` (from
    /// `ToolRegistry::generate_stubs`) spliced in ahead of it and sandbox
    /// tool calls dispatched through `registry`.
    ///
    /// `registry` is `Arc`-wrapped because each `__tool_call__` message is
    /// serviced by its own spawned task, so that multiple sandbox tool calls
    /// can be in flight at once; dispatch results are routed back to the IPC
    /// loop by `call_id` over an mpsc channel rather than a shared pending
    /// map, since each task already knows the single `call_id` it owns.
    ///
    /// Never panics and never propagates an error past this boundary —
    /// quota violations, timeouts, and spawn failures are all folded into
    /// the returned [`ExecutionResult`].
    pub async fn execute(
        &self,
        code: &str,
        tool_stubs: &str,
        registry: &Arc<ToolRegistry>,
        context: Option<&ExecutionContext>,
        cancellation_token: &CancellationToken,
    ) -> ExecutionResult {
        if code.len() > self.config.max_code_size {
            tracing::warn!(size = code.len(), limit = self.config.max_code_size, "code exceeds max size");
            return ExecutionResult::rejected(format!(
                "code exceeds max size ({} bytes > {} byte limit)",
                code.len(),
                self.config.max_code_size
            ));
        }

        let script = assemble_script(code, tool_stubs, context);
        let grid = build_permission_grid(&self.config, context);

        let mut command = Command::new(&self.config.interpreter);
        command
            .args(&self.config.interpreter_args)
            .arg(&script)
            .current_dir(&self.config.working_dir)
            .env_clear()
            // PATH is needed to resolve the interpreter executable itself;
            // this is distinct from the sandboxed script's own ability to
            // read environment variables, which the bridge never exposes.
            .env("PATH", std::env::var("PATH").unwrap_or_default())
            .env(PERMISSIONS_ENV_VAR, grid.to_json())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(interpreter = %self.config.interpreter, "spawning sandbox interpreter");
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                return ExecutionResult::rejected(format!("failed to start interpreter: {error}"));
            }
        };

        let stdin = child.stdin.take().expect("stdin piped at spawn");
        let stdout = child.stdout.take().expect("stdout piped at spawn");
        let stderr = child.stderr.take().expect("stderr piped at spawn");

        let started = Instant::now();
        let outcome = run_ipc_loop(&self.config, registry, stdin, stdout, stderr, cancellation_token).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let _ = child.start_kill();
        let _ = child.wait().await;

        match outcome {
            Outcome::Completed { output, tool_calls_made } => {
                tracing::debug!(tool_calls_made, duration_ms, "sandbox execution completed");
                ExecutionResult {
                    success: true,
                    output,
                    error: None,
                    tool_calls_made,
                    duration_ms,
                }
            }
            Outcome::Aborted { tool_calls_made, error } => {
                tracing::warn!(%error, tool_calls_made, duration_ms, "sandbox execution aborted");
                ExecutionResult {
                    success: false,
                    output: String::new(),
                    error: Some(error),
                    tool_calls_made,
                    duration_ms,
                }
            }
        }
    }
}

enum Outcome {
    Completed { output: String, tool_calls_made: usize },
    Aborted { tool_calls_made: usize, error: String },
}

/// A completed sandbox tool dispatch, routed back to the IPC loop.
struct DispatchDone {
    call_id: String,
    result: vellum_types::ToolResult,
}

async fn run_ipc_loop(
    config: &SandboxConfig,
    registry: &Arc<ToolRegistry>,
    mut stdin: tokio::process::ChildStdin,
    stdout: tokio::process::ChildStdout,
    stderr: tokio::process::ChildStderr,
    cancellation_token: &CancellationToken,
) -> Outcome {
    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();

    // Spawned dispatch tasks report back here, each tagged with its own
    // call_id; no shared pending map is needed on the host side since each
    // task already owns exactly the one call_id it was spawned for.
    let (done_tx, mut done_rx) = mpsc::channel::<DispatchDone>(32);
    let mut in_flight = 0usize;

    let mut output = String::new();
    let mut tool_calls_made = 0usize;
    let mut stdout_open = true;
    let mut stderr_open = true;
    let mut done_received = false;
    let deadline = tokio::time::Instant::now() + config.code_timeout;

    loop {
        if (!stdout_open || done_received) && in_flight == 0 {
            break;
        }

        tokio::select! {
            () = tokio::time::sleep_until(deadline) => {
                return Outcome::Aborted {
                    tool_calls_made,
                    error: format!("execution timed out after {:?}", config.code_timeout),
                };
            }
            () = cancellation_token.cancelled() => {
                return Outcome::Aborted { tool_calls_made, error: "execution cancelled".to_string() };
            }
            line = stdout_lines.next_line(), if stdout_open && !done_received => {
                match line {
                    Ok(Some(line)) => {
                        match handle_child_line(&line, config, &mut output, &mut tool_calls_made, &mut stdin, registry, &done_tx).await {
                            Ok(LineOutcome::None) => {}
                            Ok(LineOutcome::Spawned) => in_flight += 1,
                            Ok(LineOutcome::Done) => done_received = true,
                            Err(error) => return Outcome::Aborted { tool_calls_made, error },
                        }
                    }
                    Ok(None) => stdout_open = false,
                    Err(error) => {
                        return Outcome::Aborted {
                            tool_calls_made,
                            error: format!("failed reading sandbox stdout: {error}"),
                        };
                    }
                }
            }
            line = stderr_lines.next_line(), if stderr_open => {
                match line {
                    Ok(Some(line)) => {
                        if !line.trim().is_empty() {
                            tracing::debug!(stderr = %line, "sandbox stderr");
                            output.push_str(&line);
                            output.push('\n');
                        }
                    }
                    Ok(None) => stderr_open = false,
                    Err(_) => stderr_open = false,
                }
            }
            Some(done) = done_rx.recv(), if in_flight > 0 => {
                in_flight -= 1;
                let message = HostMessage::ToolResult { call_id: done.call_id, result: done.result };
                if stdin.write_all(message.to_line().as_bytes()).await.is_ok() {
                    let _ = stdin.flush().await;
                }
            }
        }
    }

    // Drain any dispatches still in flight after the sandbox has stopped
    // emitting output, so their side effects complete even though no one
    // is listening for the result anymore.
    while in_flight > 0 {
        match done_rx.recv().await {
            Some(done) => {
                in_flight -= 1;
                let message = HostMessage::ToolResult { call_id: done.call_id, result: done.result };
                let _ = stdin.write_all(message.to_line().as_bytes()).await;
            }
            None => break,
        }
    }

    Outcome::Completed { output, tool_calls_made }
}

/// What happened while handling one line of sandbox stdout.
enum LineOutcome {
    /// Nothing actionable (output/debug line, or an unparseable/blank line).
    None,
    /// A dispatch task was spawned; caller should increment its in-flight
    /// counter.
    Spawned,
    /// The wrapped user code settled; caller should stop waiting on further
    /// stdout and start winding down once any in-flight dispatches drain.
    Done,
}

/// Handle one line of sandbox stdout.
async fn handle_child_line(
    line: &str,
    config: &SandboxConfig,
    output: &mut String,
    tool_calls_made: &mut usize,
    stdin: &mut tokio::process::ChildStdin,
    registry: &Arc<ToolRegistry>,
    done_tx: &mpsc::Sender<DispatchDone>,
) -> Result<LineOutcome, String> {
    if line.trim().is_empty() {
        return Ok(LineOutcome::None);
    }
    let message: ChildMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(error) => {
            tracing::warn!(%error, %line, "failed to parse sandbox message, ignoring");
            return Ok(LineOutcome::None);
        }
    };

    match message {
        ChildMessage::Output { data } => {
            let mut chunk = data;
            if !chunk.ends_with('\n') {
                chunk.push('\n');
            }
            if output.len() + chunk.len() > config.max_output_size {
                return Err(format!("output exceeds max size ({} bytes)", config.max_output_size));
            }
            output.push_str(&chunk);
            Ok(LineOutcome::None)
        }
        ChildMessage::Debug { message } => {
            tracing::debug!(%message, "sandbox debug output");
            Ok(LineOutcome::None)
        }
        ChildMessage::Done => Ok(LineOutcome::Done),
        ChildMessage::ToolCall { name, params, call_id } => {
            *tool_calls_made += 1;
            if *tool_calls_made > config.max_tool_calls_per_exec {
                let error_message = HostMessage::ToolError {
                    call_id,
                    error: format!("exceeded tool call quota of {}", config.max_tool_calls_per_exec),
                };
                let _ = stdin.write_all(error_message.to_line().as_bytes()).await;
                let _ = stdin.flush().await;
                Ok(LineOutcome::None)
            } else {
                let registry = Arc::clone(registry);
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let result = registry.dispatch(&name, &params).await;
                    let _ = done_tx.send(DispatchDone { call_id, result }).await;
                });
                Ok(LineOutcome::Spawned)
            }
        }
    }
}
