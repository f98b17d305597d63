//! The tool handler trait.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use vellum_types::ToolResult;

/// A tool's implementation.
///
/// Handlers never propagate a `Result` across the dispatch boundary: a
/// handler that fails internally returns `ToolResult::err(..)` itself. This
/// is a hand-erased trait object rather than an RPITIT trait, since the
/// registry stores a heterogeneous `HashMap` of handlers and therefore needs
/// dyn-compatibility.
pub trait ToolHandler: Send + Sync {
    /// Invoke the handler with the given, already-validated parameters.
    fn call<'a>(
        &'a self,
        params: &'a HashMap<String, serde_json::Value>,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send + 'a>>;
}

impl<F, Fut> ToolHandler for F
where
    F: Fn(&HashMap<String, serde_json::Value>) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    fn call<'a>(
        &'a self,
        params: &'a HashMap<String, serde_json::Value>,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send + 'a>> {
        Box::pin(self(params))
    }
}
