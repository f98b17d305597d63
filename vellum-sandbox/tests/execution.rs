//! Integration tests for the sandboxed code executor.
//!
//! Tests that spawn a real `node` interpreter are `#[ignore]` by default,
//! since they depend on an external binary being present. Run them with:
//!
//! ```sh
//! cargo test --test execution -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vellum_sandbox::{CodeExecutor, SandboxConfig};
use vellum_tool::ToolRegistry;
use vellum_types::{ParamType, ToolDefinition, ToolParameter, ToolResult};

fn empty_registry() -> Arc<ToolRegistry> {
    Arc::new(ToolRegistry::new())
}

#[tokio::test]
async fn rejects_oversized_code_without_spawning_interpreter() {
    let config = SandboxConfig {
        max_code_size: 10,
        ..Default::default()
    };
    let executor = CodeExecutor::new(config);
    let registry = empty_registry();
    let token = CancellationToken::new();

    let result = executor
        .execute("x".repeat(11).as_str(), "", &registry, None, &token)
        .await;

    assert!(!result.success);
    assert_eq!(result.tool_calls_made, 0);
    assert_eq!(result.duration_ms, 0);
    assert!(result.error.unwrap().contains("exceeds max size"));
}

#[tokio::test]
async fn reports_spawn_failure_for_missing_interpreter() {
    let config = SandboxConfig {
        interpreter: "definitely-not-a-real-interpreter-binary".to_string(),
        ..Default::default()
    };
    let executor = CodeExecutor::new(config);
    let registry = empty_registry();
    let token = CancellationToken::new();

    let result = executor.execute("output(1);", "", &registry, None, &token).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("failed to start interpreter"));
}

#[tokio::test]
#[ignore] // requires a `node` binary on PATH
async fn real_node_runs_code_and_captures_output() {
    let executor = CodeExecutor::new(SandboxConfig::default());
    let registry = empty_registry();
    let token = CancellationToken::new();

    let result = executor
        .execute("output('hello from sandbox');", "", &registry, None, &token)
        .await;

    assert!(result.success, "error: {:?}", result.error);
    assert!(result.output.contains("hello from sandbox"));
    assert_eq!(result.tool_calls_made, 0);
}

#[tokio::test]
#[ignore] // requires a `node` binary on PATH
async fn real_node_dispatches_a_sandbox_tool_call() {
    let mut registry = ToolRegistry::new();
    registry
        .register(
            ToolDefinition {
                name: "add_one".to_string(),
                description: "adds one to n".to_string(),
                parameters: vec![ToolParameter::optional("n", ParamType::Number, "the number")],
            },
            |params: &std::collections::HashMap<String, serde_json::Value>| {
                let n = params.get("n").and_then(serde_json::Value::as_i64).unwrap_or(0);
                async move { ToolResult::ok((n + 1).to_string()) }
            },
        )
        .unwrap();
    let stubs = registry.generate_stubs();

    let executor = CodeExecutor::new(SandboxConfig::default());
    let registry = Arc::new(registry);
    let token = CancellationToken::new();

    let code = "add_one({ n: 41 }).then((r) => output(r));";
    let result = executor.execute(code, &stubs, &registry, None, &token).await;

    assert!(result.success, "error: {:?}", result.error);
    assert!(result.output.contains('4'));
    assert_eq!(result.tool_calls_made, 1);
}

#[tokio::test]
async fn aborts_on_timeout_without_a_real_interpreter() {
    // `sleep` is not a node dependency but this exercises the timeout path
    // even when the configured interpreter is missing: spawn failure is
    // reported immediately rather than waiting out the deadline.
    let config = SandboxConfig {
        interpreter: "definitely-not-a-real-interpreter-binary".to_string(),
        code_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let executor = CodeExecutor::new(config);
    let registry = empty_registry();
    let token = CancellationToken::new();

    let result = executor.execute("output(1);", "", &registry, None, &token).await;
    assert!(!result.success);
}

#[tokio::test]
#[ignore] // requires a `node` binary on PATH
async fn real_node_folds_stderr_into_output() {
    let executor = CodeExecutor::new(SandboxConfig::default());
    let registry = empty_registry();
    let token = CancellationToken::new();

    // Bypass the bridge's console.error redirection and write to the
    // process's real stderr, the way a denied `SandboxPermission` would.
    let code = "process.stderr.write('permission denied: fs\\n');";
    let result = executor.execute(code, "", &registry, None, &token).await;

    assert!(result.success, "error: {:?}", result.error);
    assert!(result.output.contains("permission denied: fs"));
}

#[tokio::test]
#[ignore] // requires a `node` binary on PATH
async fn cancellation_token_aborts_long_running_execution() {
    let config = SandboxConfig {
        code_timeout: Duration::from_secs(30),
        ..Default::default()
    };
    let executor = CodeExecutor::new(config);
    let registry = empty_registry();
    let token = CancellationToken::new();
    let cancel_handle = token.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel_handle.cancel();
    });

    let result = executor
        .execute("setTimeout(() => {}, 60000);", "", &registry, None, &token)
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("cancelled"));
}
