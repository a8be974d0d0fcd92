// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{HangwatchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::HangwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.executor, raw.diagnostics))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_executor(cfg)?;
    validate_diagnostics(cfg)?;
    Ok(())
}

fn validate_executor(cfg: &RawConfigFile) -> Result<()> {
    if cfg.executor.worker_threads == 0 {
        return Err(HangwatchError::ConfigError(
            "[executor].worker_threads must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_diagnostics(cfg: &RawConfigFile) -> Result<()> {
    let diag = &cfg.diagnostics;

    // A disabled section is never used, so don't reject half-filled ones.
    if !diag.enabled {
        return Ok(());
    }

    if diag.tool.trim().is_empty() {
        return Err(HangwatchError::ConfigError(
            "[diagnostics].tool must not be empty".to_string(),
        ));
    }

    if diag.invocation_timeout.as_duration().is_zero() {
        return Err(HangwatchError::ConfigError(
            "[diagnostics].invocation_timeout must be greater than zero".to_string(),
        ));
    }

    if diag.output.as_os_str().is_empty() {
        return Err(HangwatchError::ConfigError(
            "[diagnostics].output must not be empty".to_string(),
        ));
    }

    Ok(())
}
