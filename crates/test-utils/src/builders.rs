#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use hangwatch::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn worker_threads(mut self, n: usize) -> Self {
        self.config.executor.worker_threads = n;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.executor.shutdown_grace = grace.into();
        self
    }

    pub fn diagnostics_enabled(mut self, enabled: bool) -> Self {
        self.config.diagnostics.enabled = enabled;
        self
    }

    pub fn tool(mut self, tool: &str) -> Self {
        self.config.diagnostics.tool = tool.to_string();
        self
    }

    pub fn tool_arg(mut self, arg: &str) -> Self {
        self.config.diagnostics.args.push(arg.to_string());
        self
    }

    pub fn force_flag(mut self, flag: &str) -> Self {
        self.config.diagnostics.force_flag = flag.to_string();
        self
    }

    pub fn invocation_timeout(mut self, limit: Duration) -> Self {
        self.config.diagnostics.invocation_timeout = limit.into();
        self
    }

    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.config.diagnostics.output = path.as_ref().to_path_buf();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
