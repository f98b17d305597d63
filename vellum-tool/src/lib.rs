#![deny(missing_docs)]
//! Tool registry: typed registration, parameter validation, schema
//! conversion, sandbox stub generation, and dispatch by name.

mod handler;
mod registry;
mod reserved;
mod stubs;

pub use handler::ToolHandler;
pub use registry::ToolRegistry;
pub use reserved::{compact_context_definition, execute_code_definition, COMPACT_CONTEXT, EXECUTE_CODE};
