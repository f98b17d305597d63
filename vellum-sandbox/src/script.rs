//! Assembles the four-part script delivered to the interpreter: the bridge
//! preamble, generated tool stubs, credential constants, then the user code
//! verbatim — the user code wrapped in an async IIFE that signals
//! `__signalDone__()` once it settles, so the host side of the IPC loop has
//! an explicit completion marker instead of depending on the child process
//! exiting (the bridge's stdin `readline` interface would otherwise keep the
//! event loop alive past the user code's own completion).

use crate::bridge::BRIDGE_PREAMBLE;
use crate::config::{BlueskyContext, ExecutionContext};

/// Concatenate the bridge preamble, `tool_stubs`, any credential constants
/// from `context`, and `user_code` wrapped to signal completion, in that
/// order.
#[must_use]
pub fn assemble_script(user_code: &str, tool_stubs: &str, context: Option<&ExecutionContext>) -> String {
    let mut script = String::with_capacity(BRIDGE_PREAMBLE.len() + tool_stubs.len() + user_code.len() + 256);
    script.push_str(BRIDGE_PREAMBLE);
    script.push('\n');
    script.push_str(tool_stubs);
    script.push('\n');
    if let Some(bluesky) = context.and_then(|c| c.bluesky.as_ref()) {
        script.push_str(&credential_constants(bluesky));
        script.push('\n');
    }
    script.push_str(&wrap_user_code(user_code));
    script
}

/// Wrap `user_code` in an async IIFE so `__signalDone__()` fires exactly
/// once, whether the user code resolves, throws, or returns early. A thrown
/// error is routed to `debug(...)` (surfacing on the host's diagnostic
/// stream) rather than aborting the wrapper before it can signal done.
fn wrap_user_code(user_code: &str) -> String {
    format!(
        "(async () => {{\n  try {{\n{user_code}\n  }} catch (__error__) {{\n    debug(String((__error__ && __error__.stack) || __error__));\n  }} finally {{\n    __signalDone__();\n  }}\n}})();\n"
    )
}

fn credential_constants(bluesky: &BlueskyContext) -> String {
    format!(
        "const BSKY_PDS_URL = {};\nconst BSKY_HANDLE = {};\nconst BSKY_APP_PASSWORD = {};\nconst BSKY_DID = {};\nconst BSKY_SERVICE_DID = {};\n",
        js_string(&bluesky.pds_url),
        js_string(&bluesky.handle),
        js_string(&bluesky.app_password),
        js_string(&bluesky.did),
        js_string(&bluesky.service_did),
    )
}

/// Render `value` as a properly escaped JavaScript string literal. JSON
/// string escaping is a strict subset of what JavaScript accepts, so
/// `serde_json`'s encoder produces a valid, safe literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_bridge_stubs_credentials_then_user_code() {
        let script = assemble_script("output('hi');", "// stub\n", None);
        let bridge_pos = script.find("function __callTool__").unwrap();
        let stub_pos = script.find("// stub").unwrap();
        let code_pos = script.find("output('hi')").unwrap();
        assert!(bridge_pos < stub_pos);
        assert!(stub_pos < code_pos);
    }

    #[test]
    fn wraps_user_code_in_an_async_iife_that_signals_done() {
        let script = assemble_script("output('hi');", "", None);
        assert!(script.contains("(async () => {"));
        assert!(script.contains("} finally {\n    __signalDone__();\n  }"));
        let iife_pos = script.find("(async () => {").unwrap();
        let code_pos = script.find("output('hi')").unwrap();
        let done_pos = script.find("__signalDone__()").unwrap();
        assert!(iife_pos < code_pos);
        assert!(code_pos < done_pos);
    }

    #[test]
    fn omits_credential_constants_when_no_bluesky_context() {
        let script = assemble_script("1;", "", None);
        assert!(!script.contains("BSKY_"));
    }

    #[test]
    fn escapes_credential_values_as_js_string_literals() {
        let context = ExecutionContext {
            bluesky: Some(BlueskyContext {
                pds_url: "https://bsky.social".to_string(),
                handle: "ali\"ce".to_string(),
                app_password: "p\\w".to_string(),
                did: "did:plc:x".to_string(),
                service_did: "did:web:bsky.social".to_string(),
            }),
        };
        let script = assemble_script("", "", Some(&context));
        assert!(script.contains(r#"const BSKY_HANDLE = "ali\"ce";"#));
        assert!(script.contains(r#"const BSKY_APP_PASSWORD = "p\\w";"#));
        assert!(script.contains("const BSKY_PDS_URL ="));
        assert!(script.contains("const BSKY_DID ="));
        assert!(script.contains("const BSKY_SERVICE_DID ="));
    }
}
