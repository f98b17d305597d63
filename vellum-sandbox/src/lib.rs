#![deny(missing_docs)]
//! Sandboxed code executor: spawns an interpreter subprocess, exposes a
//! bridge letting sandboxed code invoke host tools over a newline-delimited
//! JSON channel on stdin/stdout, and enforces the host-side quotas (code
//! size, output size, tool-call count, wall clock) the child cannot be
//! trusted to enforce on itself.

mod bridge;
mod config;
mod executor;
mod ipc;
mod permissions;
mod script;

pub use config::{BlueskyContext, ExecutionContext, ExecutionResult, SandboxConfig};
pub use executor::CodeExecutor;
pub use ipc::{ChildMessage, HostMessage};
pub use permissions::{allows_read, allows_spawn, build_permission_grid, PermissionGrid, PERMISSIONS_ENV_VAR};
pub use script::assemble_script;

pub use bridge::BRIDGE_PREAMBLE;
