//! Sandbox bridge preamble: the JavaScript injected ahead of the generated
//! tool stubs and user code, exposing `output`, `debug`, and `__callTool__`,
//! routing `__tool_result__`/`__tool_error__` replies by `call_id`, and
//! signaling `__done__` once the wrapped user code settles (see
//! `crate::script::assemble_script`) — otherwise the open stdin `readline`
//! interface keeps the event loop alive and the host never sees stdout EOF.
pub const BRIDGE_PREAMBLE: &str = r#"
const __pending__ = new Map();
let __callId__ = 0;

function __send__(message) {
  process.stdout.write(JSON.stringify(message) + "\n");
}

function output(data) {
  __send__({ type: "__output__", data: String(data) });
}

function debug(message) {
  __send__({ type: "__debug__", message: String(message) });
}

function __callTool__(name, params) {
  const call_id = String(++__callId__);
  return new Promise((resolve, reject) => {
    __pending__.set(call_id, { resolve, reject });
    __send__({ type: "__tool_call__", name, params: params || {}, call_id });
  });
}

const __stdinReader__ = require("readline").createInterface({ input: process.stdin });
__stdinReader__.on("line", (line) => {
  if (!line.trim()) return;
  let message;
  try {
    message = JSON.parse(line);
  } catch (err) {
    return;
  }
  const pending = __pending__.get(message.call_id);
  if (!pending) return;
  __pending__.delete(message.call_id);
  if (message.type === "__tool_result__") {
    pending.resolve(message.result);
  } else if (message.type === "__tool_error__") {
    pending.reject(new Error(message.error));
  }
});

function __signalDone__() {
  __send__({ type: "__done__" });
  __stdinReader__.close();
}

console.log = output;
console.error = debug;
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_the_three_bridge_functions() {
        assert!(BRIDGE_PREAMBLE.contains("function output("));
        assert!(BRIDGE_PREAMBLE.contains("function debug("));
        assert!(BRIDGE_PREAMBLE.contains("function __callTool__("));
    }

    #[test]
    fn routes_stdin_lines_by_call_id() {
        assert!(BRIDGE_PREAMBLE.contains("__pending__.get(message.call_id)"));
        assert!(BRIDGE_PREAMBLE.contains("__tool_result__"));
        assert!(BRIDGE_PREAMBLE.contains("__tool_error__"));
    }

    #[test]
    fn signals_done_and_closes_the_stdin_reader() {
        assert!(BRIDGE_PREAMBLE.contains("function __signalDone__("));
        assert!(BRIDGE_PREAMBLE.contains(r#"{ type: "__done__" }"#));
        assert!(BRIDGE_PREAMBLE.contains("__stdinReader__.close();"));
    }

    #[test]
    fn redirects_console_log_to_output() {
        assert!(BRIDGE_PREAMBLE.contains("console.log = output;"));
    }
}
