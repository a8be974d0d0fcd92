// src/runner.rs

//! Run a command on a dedicated worker thread under a deadline.
//!
//! The worker thread owns the child process and polls it. When the deadline
//! fires, the worker observes the interrupt, kills the child and returns.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use crate::interrupt;
use crate::timeout::TimeoutHandler;

/// How often the worker checks on its child between interrupts.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a guarded command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The command exited on its own. `None` if it was killed by a signal.
    Completed(Option<i32>),
    /// The deadline fired and the command was cancelled.
    TimedOut,
}

impl RunOutcome {
    /// Exit code in the style of coreutils `timeout`.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed(Some(code)) => *code,
            RunOutcome::Completed(None) => 1,
            RunOutcome::TimedOut => 124,
        }
    }
}

/// Run `command` (program followed by its arguments), cancelling it if it
/// outlives `timeout`.
pub fn run_with_deadline(
    handler: &dyn TimeoutHandler,
    command: &[String],
    timeout: Duration,
) -> Result<RunOutcome> {
    let (program, args) = command
        .split_first()
        .context("no command given to run")?;
    let program = program.clone();
    let args = args.to_vec();

    let (join, worker) = interrupt::spawn("hangwatch-worker", move || run_child(&program, &args))
        .context("spawning worker thread")?;

    let deadline = handler.start(worker, timeout)?;

    let result = join
        .join()
        .map_err(|_| anyhow!("worker thread panicked"))?;
    deadline.stop();

    let code = result?;
    if deadline.timed_out() {
        info!(timeout_ms = timeout.as_millis() as u64, "command timed out");
        Ok(RunOutcome::TimedOut)
    } else {
        Ok(RunOutcome::Completed(code))
    }
}

fn run_child(program: &str, args: &[String]) -> Result<Option<i32>> {
    let mut child = Command::new(program)
        .args(args)
        .spawn()
        .with_context(|| format!("spawning '{program}'"))?;
    let pid = child.id();
    debug!(pid, program, "command started");

    loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("waiting for '{program}'"))?
        {
            debug!(pid, exit_code = ?status.code(), "command exited");
            return Ok(status.code());
        }

        if interrupt::sleep(POLL_INTERVAL).is_err() {
            info!(pid, program, "worker interrupted; killing command");
            if let Err(e) = child.kill() {
                warn!(pid, error = %e, "failed to kill command on interrupt");
            }
            let status = child
                .wait()
                .with_context(|| format!("reaping '{program}'"))?;
            return Ok(status.code());
        }
    }
}
