// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::HumanDuration;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [executor]
/// worker_threads = 1
/// shutdown_grace = "5s"
///
/// [diagnostics]
/// enabled = true
/// tool = "jstack"
/// force_flag = "-F"
/// invocation_timeout = "10s"
/// output = "hangwatch-stacks.txt"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Timer facility settings from `[executor]`.
    #[serde(default)]
    pub executor: ExecutorSection,

    /// Stack-dump collection settings from `[diagnostics]`.
    #[serde(default)]
    pub diagnostics: DiagnosticsSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub executor: ExecutorSection,
    pub diagnostics: DiagnosticsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(executor: ExecutorSection, diagnostics: DiagnosticsSection) -> Self {
        Self {
            executor,
            diagnostics,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(ExecutorSection::default(), DiagnosticsSection::default())
    }
}

/// `[executor]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorSection {
    /// Number of timer threads that run deferred timeout actions.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// How long `stop()` waits for deferred actions that are already running.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: HumanDuration,
}

fn default_worker_threads() -> usize {
    1
}

fn default_shutdown_grace() -> HumanDuration {
    HumanDuration(Duration::from_secs(5))
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

/// `[diagnostics]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsSection {
    /// When false, a firing timeout only delivers the cancellation signal.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Stack-dump executable; resolved against `PATH` if not absolute.
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Extra arguments placed before the process id in every invocation.
    #[serde(default)]
    pub args: Vec<String>,

    /// Flag that selects the tool's forced mode for the fallback attempt.
    ///
    /// Empty means the tool has no forced mode and the fallback is a plain
    /// retry.
    #[serde(default = "default_force_flag")]
    pub force_flag: String,

    /// Upper bound for a single tool invocation.
    #[serde(default = "default_invocation_timeout")]
    pub invocation_timeout: HumanDuration,

    /// File that collected stack dumps are appended to.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_enabled() -> bool {
    true
}

fn default_tool() -> String {
    "jstack".to_string()
}

fn default_force_flag() -> String {
    "-F".to_string()
}

fn default_invocation_timeout() -> HumanDuration {
    HumanDuration(Duration::from_secs(10))
}

fn default_output() -> PathBuf {
    PathBuf::from("hangwatch-stacks.txt")
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            tool: default_tool(),
            args: Vec::new(),
            force_flag: default_force_flag(),
            invocation_timeout: default_invocation_timeout(),
            output: default_output(),
        }
    }
}
