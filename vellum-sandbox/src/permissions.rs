//! Permission grid construction: the declarative contract passed to the
//! sandbox process.
//!
//! The grid is not kernel-enforced isolation — the child is a plain
//! subprocess — it is a declarative contract serialized into the child's
//! environment (`VELLUM_SANDBOX_PERMISSIONS`) that a conforming interpreter
//! shim is expected to consult before honoring a `fetch`, `fs`, or spawn
//! call. Enforcement of the quotas that the host *can* police unilaterally
//! (output size, tool-call count, wall clock) lives in [`crate::executor`]
//! instead.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{ExecutionContext, SandboxConfig};

/// Name of the environment variable the assembled permission grid is passed
/// under.
pub const PERMISSIONS_ENV_VAR: &str = "VELLUM_SANDBOX_PERMISSIONS";

/// The permission grid for one execution.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionGrid {
    /// Allowlisted network hosts, deduplicated.
    pub network_hosts: Vec<String>,
    /// Paths the child may read.
    pub read_paths: Vec<PathBuf>,
    /// Paths the child may write: the working directory only.
    pub write_paths: Vec<PathBuf>,
    /// Executable names the child may spawn.
    pub allowed_run: Vec<String>,
    /// Always `false`: environment variable access is denied.
    pub environment: bool,
    /// Always `false`: FFI is denied.
    pub ffi: bool,
    /// Always `false`: system info queries are denied.
    pub system_info: bool,
}

impl PermissionGrid {
    /// Serialize to the JSON form passed via [`PERMISSIONS_ENV_VAR`].
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Build the permission grid for one execution, folding in the host from
/// `context.bluesky.pds_url` when present.
#[must_use]
pub fn build_permission_grid(config: &SandboxConfig, context: Option<&ExecutionContext>) -> PermissionGrid {
    let mut network_hosts = config.allowed_hosts.clone();
    if let Some(bluesky) = context.and_then(|c| c.bluesky.as_ref())
        && let Some(host) = host_of(&bluesky.pds_url)
        && !network_hosts.iter().any(|h| h == &host)
    {
        network_hosts.push(host);
    }

    let mut read_paths = vec![config.working_dir.clone()];
    read_paths.extend(config.allowed_read_paths.iter().cloned());

    PermissionGrid {
        network_hosts,
        read_paths,
        write_paths: vec![config.working_dir.clone()],
        allowed_run: config.allowed_run.clone(),
        environment: false,
        ffi: false,
        system_info: false,
    }
}

fn host_of(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = without_scheme.split(['/', ':']).next()?;
    (!host.is_empty()).then(|| host.to_string())
}

/// Whether `executable` is permitted to be spawned under `grid`.
#[must_use]
pub fn allows_spawn(grid: &PermissionGrid, executable: &str) -> bool {
    grid.allowed_run.iter().any(|name| name == executable)
}

/// Whether `path` falls under one of `grid`'s readable roots.
#[must_use]
pub fn allows_read(grid: &PermissionGrid, path: &Path) -> bool {
    grid.read_paths.iter().any(|root| path.starts_with(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_configured_allowed_hosts() {
        let config = SandboxConfig {
            allowed_hosts: vec!["api.example.com".to_string()],
            ..Default::default()
        };
        let grid = build_permission_grid(&config, None);
        assert_eq!(grid.network_hosts, vec!["api.example.com".to_string()]);
    }

    #[test]
    fn adds_bluesky_pds_host_deduplicated() {
        let config = SandboxConfig {
            allowed_hosts: vec!["bsky.social".to_string()],
            ..Default::default()
        };
        let context = ExecutionContext {
            bluesky: Some(crate::config::BlueskyContext {
                pds_url: "https://bsky.social/xrpc".to_string(),
                handle: "alice.bsky.social".to_string(),
                app_password: "secret".to_string(),
                did: "did:plc:alice".to_string(),
                service_did: "did:web:bsky.social".to_string(),
            }),
        };
        let grid = build_permission_grid(&config, Some(&context));
        assert_eq!(grid.network_hosts, vec!["bsky.social".to_string()]);
    }

    #[test]
    fn write_paths_are_working_dir_only() {
        let config = SandboxConfig {
            working_dir: PathBuf::from("/tmp/sandbox"),
            allowed_read_paths: vec![PathBuf::from("/data")],
            ..Default::default()
        };
        let grid = build_permission_grid(&config, None);
        assert_eq!(grid.write_paths, vec![PathBuf::from("/tmp/sandbox")]);
        assert!(grid.read_paths.contains(&PathBuf::from("/data")));
        assert!(grid.read_paths.contains(&PathBuf::from("/tmp/sandbox")));
    }

    #[test]
    fn denies_spawn_not_in_allowlist() {
        let grid = build_permission_grid(&SandboxConfig::default(), None);
        assert!(!allows_spawn(&grid, "curl"));
        let config = SandboxConfig {
            allowed_run: vec!["curl".to_string()],
            ..Default::default()
        };
        let grid = build_permission_grid(&config, None);
        assert!(allows_spawn(&grid, "curl"));
    }
}
