// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::HumanDuration;

/// Command-line arguments for `hangwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hangwatch",
    version,
    about = "Run a command under a deadline; dump stack traces of the process tree if it hangs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Hangwatch.toml` in the current directory is used when it
    /// exists, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Deadline for the command, e.g. `30s`, `500ms`, `5m`.
    #[arg(long, value_name = "DURATION", required_unless_present = "dry_run")]
    pub timeout: Option<HumanDuration>,

    /// Skip stack dump collection even if enabled in the config.
    #[arg(long)]
    pub no_diagnostics: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HANGWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved configuration, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// The command to run, after `--`.
    #[arg(last = true, value_name = "COMMAND", required_unless_present = "dry_run")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
