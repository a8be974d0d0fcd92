// src/lib.rs

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod interrupt;
pub mod logging;
pub mod runner;
pub mod timeout;
pub mod types;

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_and_validate, load_or_default};
use crate::runner::run_with_deadline;
use crate::timeout::{DefaultTimeoutHandler, TimeoutHandler};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading
/// - the timeout handler (timer executor + diagnostics)
/// - the guarded command on its worker thread
pub fn run(args: CliArgs) -> Result<i32> {
    let mut cfg = match &args.config {
        Some(path) => load_and_validate(path).with_context(|| format!("loading config {path}"))?,
        None => load_or_default(default_config_path())?,
    };
    if args.no_diagnostics {
        cfg.diagnostics.enabled = false;
    }

    if args.dry_run {
        print_dry_run(&cfg, &args);
        return Ok(0);
    }

    let timeout = args
        .timeout
        .context("--timeout is required unless --dry-run is given")?
        .as_duration();

    let handler = DefaultTimeoutHandler::from_config(&cfg)?;
    let outcome = run_with_deadline(&handler, &args.command, timeout);
    handler.stop();

    let outcome = outcome?;
    debug!(?outcome, "guarded command finished");
    Ok(outcome.exit_code())
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile, args: &CliArgs) {
    println!("hangwatch dry-run");
    println!("  executor.worker_threads = {}", cfg.executor.worker_threads);
    println!("  executor.shutdown_grace = {}", cfg.executor.shutdown_grace);
    println!();

    let diag = &cfg.diagnostics;
    println!("diagnostics:");
    println!("  enabled = {}", diag.enabled);
    println!("  tool = {}", diag.tool);
    if !diag.args.is_empty() {
        println!("  args = {:?}", diag.args);
    }
    if !diag.force_flag.is_empty() {
        println!("  force_flag = {}", diag.force_flag);
    }
    println!("  invocation_timeout = {}", diag.invocation_timeout);
    println!("  output = {}", diag.output.display());

    if let Some(timeout) = args.timeout {
        println!();
        println!("timeout = {timeout}");
    }
    if !args.command.is_empty() {
        println!("command = {:?}", args.command);
    }

    debug!("dry-run complete (no execution)");
}
