//! Tool registry: typed registration, parameter validation, and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use vellum_types::{ParamType, ToolDefinition, ToolParameter, ToolRegistryError, ToolResult};

use crate::handler::ToolHandler;
use crate::reserved::sentinel_handler;

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Holds tool definitions and handlers, keyed by name.
///
/// Append-only after construction: there is no `unregister`. `register` must
/// run to completion for every tool before any `dispatch` call is made.
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool under `definition.name`.
    ///
    /// Fails with [`ToolRegistryError::DuplicateName`] if the name is already
    /// present, and with [`ToolRegistryError::InvalidEnumType`] if any
    /// parameter declares `enum_values` on a non-string type — both rejected
    /// at registration time so a bad tool definition fails fast at startup
    /// rather than on first dispatch.
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), ToolRegistryError> {
        if self.tools.contains_key(&definition.name) {
            return Err(ToolRegistryError::DuplicateName(definition.name));
        }
        for param in &definition.parameters {
            if param.enum_values.is_some() && param.param_type != ParamType::String {
                return Err(ToolRegistryError::InvalidEnumType {
                    tool: definition.name.clone(),
                    parameter: param.name.clone(),
                });
            }
        }
        let name = definition.name.clone();
        tracing::debug!(tool = %name, "registered tool");
        self.order.push(name.clone());
        self.tools.insert(
            name,
            RegisteredTool {
                definition,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Register a reserved name (`execute_code`, `compact_context`) whose
    /// handler is a sentinel: it is never invoked because the agent loop
    /// intercepts these names before calling [`ToolRegistry::dispatch`].
    /// Exists so the names still appear in [`ToolRegistry::to_model_tools`]
    /// and [`ToolRegistry::generate_stubs`].
    pub fn register_sentinel(&mut self, definition: ToolDefinition) -> Result<(), ToolRegistryError> {
        self.register(definition, sentinel_handler())
    }

    /// The ordered tool definitions, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.definition.clone())
            .collect()
    }

    /// Convert every definition to the model's tool-schema shape.
    #[must_use]
    pub fn to_model_tools(&self) -> Vec<serde_json::Value> {
        self.definitions().iter().map(tool_to_schema).collect()
    }

    /// Emit a text blob of JavaScript function stubs, one per tool, each
    /// calling `__callTool__` and returning its result. See
    /// [`crate::stubs::generate_stubs`].
    #[must_use]
    pub fn generate_stubs(&self) -> String {
        crate::stubs::generate_stubs(&self.definitions())
    }

    /// Dispatch a call by name. Never fails with an exception — validation
    /// and handler failures are both folded into the returned [`ToolResult`].
    ///
    /// Sequence: unknown name, then per-parameter required check, then
    /// per-parameter type check, then enum membership check, then handler
    /// invocation.
    pub async fn dispatch(&self, name: &str, params: &HashMap<String, serde_json::Value>) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::err(format!("unknown tool: {name}"));
        };

        if let Err(reason) = validate_params(&tool.definition.parameters, params) {
            return ToolResult::err(reason);
        }

        tracing::debug!(tool = %name, "dispatching tool call");
        tool.handler.call(params).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_params(
    declared: &[ToolParameter],
    provided: &HashMap<String, serde_json::Value>,
) -> Result<(), String> {
    for param in declared {
        if param.required && !provided.contains_key(&param.name) {
            return Err(format!("missing required parameter: {}", param.name));
        }
    }

    for param in declared {
        let Some(value) = provided.get(&param.name) else {
            continue;
        };
        if !json_type_matches(value, param.param_type) {
            return Err(format!(
                "parameter '{}' expected type {:?}, got {}",
                param.name,
                param.param_type,
                json_type_name(value)
            ));
        }
        if let Some(allowed) = &param.enum_values
            && let Some(s) = value.as_str()
            && !allowed.iter().any(|v| v == s)
        {
            return Err(format!(
                "parameter '{}' value '{s}' is not one of {allowed:?}",
                param.name
            ));
        }
    }

    Ok(())
}

fn json_type_matches(value: &serde_json::Value, expected: ParamType) -> bool {
    match expected {
        ParamType::String => value.is_string(),
        ParamType::Number => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Object => value.is_object(),
        ParamType::Array => value.is_array(),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn param_type_name(param_type: ParamType) -> &'static str {
    match param_type {
        ParamType::String => "string",
        ParamType::Number => "number",
        ParamType::Boolean => "boolean",
        ParamType::Object => "object",
        ParamType::Array => "array",
    }
}

fn tool_to_schema(def: &ToolDefinition) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for param in &def.parameters {
        let mut prop = json!({
            "type": param_type_name(param.param_type),
            "description": param.description,
        });
        if let Some(enum_values) = &param.enum_values {
            prop["enum"] = json!(enum_values);
        }
        properties.insert(param.name.clone(), prop);
        if param.required {
            required.push(param.name.clone());
        }
    }
    json!({
        "name": def.name,
        "description": def.description,
        "input_schema": {
            "type": "object",
            "properties": serde_json::Value::Object(properties),
            "required": required,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_types::ToolResult;

    fn echo_definition() -> ToolDefinition {
        ToolDefinition {
            name: "echo".to_string(),
            description: "echoes its input".to_string(),
            parameters: vec![ToolParameter::required_string("message", "text to echo")],
        }
    }

    #[tokio::test]
    async fn dispatch_unknown_name_does_not_invoke_handler() {
        let mut registry = ToolRegistry::new();
        let invoked = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let invoked2 = invoked.clone();
        registry
            .register(echo_definition(), move |params: &HashMap<String, serde_json::Value>| {
                let invoked = invoked2.clone();
                let msg = params.get("message").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                async move {
                    invoked.store(true, std::sync::atomic::Ordering::SeqCst);
                    ToolResult::ok(msg)
                }
            })
            .unwrap();

        let result = registry.dispatch("missing", &HashMap::new()).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown tool: missing"));
        assert!(!invoked.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn register_then_dispatch_calls_handler_once_with_params() {
        let mut registry = ToolRegistry::new();
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let calls2 = calls.clone();
        registry
            .register(echo_definition(), move |params: &HashMap<String, serde_json::Value>| {
                let calls = calls2.clone();
                let msg = params.get("message").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                async move {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    ToolResult::ok(format!("echo: {msg}"))
                }
            })
            .unwrap();

        let mut params = HashMap::new();
        params.insert("message".to_string(), json!("hi"));
        let result = registry.dispatch("echo", &params).await;
        assert!(result.success);
        assert_eq!(result.output, "echo: hi");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispatch_missing_required_param_rejects_without_invoking_handler() {
        let mut registry = ToolRegistry::new();
        registry
            .register(echo_definition(), |_: &HashMap<String, serde_json::Value>| async {
                panic!("handler should not run")
            })
            .unwrap();
        let result = registry.dispatch("echo", &HashMap::new()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("missing required parameter"));
    }

    #[test]
    fn register_duplicate_name_fails() {
        let mut registry = ToolRegistry::new();
        registry
            .register(echo_definition(), |_: &HashMap<String, serde_json::Value>| async { ToolResult::ok("") })
            .unwrap();
        let err = registry
            .register(echo_definition(), |_: &HashMap<String, serde_json::Value>| async { ToolResult::ok("") })
            .unwrap_err();
        assert!(matches!(err, ToolRegistryError::DuplicateName(name) if name == "echo"));
    }

    #[test]
    fn register_enum_on_non_string_param_fails() {
        let mut registry = ToolRegistry::new();
        let definition = ToolDefinition {
            name: "pick".to_string(),
            description: "picks a number".to_string(),
            parameters: vec![ToolParameter {
                name: "n".to_string(),
                param_type: ParamType::Number,
                description: "a number".to_string(),
                required: true,
                enum_values: Some(vec!["1".to_string()]),
            }],
        };
        let err = registry
            .register(definition, |_: &HashMap<String, serde_json::Value>| async { ToolResult::ok("") })
            .unwrap_err();
        assert!(matches!(err, ToolRegistryError::InvalidEnumType { .. }));
    }
}
