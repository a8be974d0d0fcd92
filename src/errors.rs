// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HangwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A timeout was requested after the timer facility was torn down.
    #[error("timer executor has been stopped; cannot schedule new timeouts")]
    ExecutorStopped,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure to capture a stack dump for a single process.
///
/// These never escape the deferred timeout action; the collector logs them
/// and moves on to the next process.
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("failed to start stack-dump tool '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while talking to stack-dump tool: {0}")]
    Io(#[from] std::io::Error),

    #[error("stack-dump tool did not finish within {0:?}")]
    TimedOut(std::time::Duration),

    #[error("failed to collect stack traces for process {pid} (exit code {code:?})\n{stderr}")]
    NonZeroExit {
        pid: u32,
        code: Option<i32>,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, HangwatchError>;
