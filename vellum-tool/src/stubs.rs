//! Sandbox bridge stub generation.

use vellum_types::ToolDefinition;

/// Emit one JavaScript async function per tool, each forwarding to
/// `__callTool__(name, params)`. The leading comment line lists parameter
/// names in declaration order, with a trailing `?` on optional ones, so
/// sandboxed code has a quick parameter reference without a full JSDoc
/// block per tool.
#[must_use]
pub fn generate_stubs(definitions: &[ToolDefinition]) -> String {
    let mut out = String::new();
    for def in definitions {
        let param_list = def
            .parameters
            .iter()
            .map(|p| {
                if p.required {
                    p.name.clone()
                } else {
                    format!("{}?", p.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        out.push_str(&format!("// {}({}) - {}\n", def.name, param_list, def.description));
        out.push_str(&format!(
            "async function {name}(params) {{\n  return await __callTool__(\"{name}\", params);\n}}\n\n",
            name = def.name
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_types::{ParamType, ToolParameter};

    #[test]
    fn marks_optional_params_with_trailing_question_mark() {
        let defs = vec![ToolDefinition {
            name: "search".to_string(),
            description: "searches".to_string(),
            parameters: vec![
                ToolParameter::required_string("query", "search text"),
                ToolParameter::optional("limit", ParamType::Number, "max results"),
            ],
        }];
        let stubs = generate_stubs(&defs);
        assert!(stubs.contains("search(query, limit?)"));
        assert!(stubs.contains("__callTool__(\"search\", params)"));
    }

    #[test]
    fn empty_registry_yields_empty_stub_blob() {
        assert_eq!(generate_stubs(&[]), "");
    }
}
