// src/diagnostics/capability.rs

//! Whether stack dumps can be taken on this host at all.

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    #[error("process-tree introspection is not available on this platform")]
    NoProcessTree,

    #[error("stack-dump tool '{0}' was not found")]
    ToolNotFound(String),
}

/// Check the platform and resolve `tool` to an executable path.
///
/// Names without a path separator are looked up on `PATH`.
pub fn check(tool: &str) -> Result<PathBuf, Unsupported> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return Err(Unsupported::NoProcessTree);
    }
    resolve_executable(tool).ok_or_else(|| Unsupported::ToolNotFound(tool.to_string()))
}

fn resolve_executable(tool: &str) -> Option<PathBuf> {
    let direct = Path::new(tool);
    if direct.components().count() > 1 || direct.is_absolute() {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var).find_map(|dir| {
        candidates(&dir, tool)
            .into_iter()
            .find(|candidate| candidate.is_file())
    })
}

fn candidates(dir: &Path, tool: &str) -> Vec<PathBuf> {
    let mut out = vec![dir.join(tool)];
    if cfg!(windows) {
        out.push(dir.join(format!("{tool}.exe")));
    }
    out
}
