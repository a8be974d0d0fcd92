// src/diagnostics/tool.rs

//! Invoking the external stack-dump tool.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::config::DiagnosticsSection;
use crate::errors::DiagnosticsError;

/// Which form of the tool to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// `<tool> [args..] <pid>`
    Default,
    /// `<tool> [args..] <force_flag> <pid>`, for processes that ignore the
    /// default request.
    Forced,
}

/// Outcome of one tool run. Not kept beyond the call that produced it.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    /// Exit code; `None` if the tool was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs the stack-dump tool against one process.
///
/// Production code uses [`StackDumpTool`]; tests substitute a scripted fake.
pub trait StackDumpInvoker: Send + Sync {
    fn invoke(
        &self,
        pid: u32,
        mode: InvocationMode,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationResult, DiagnosticsError>> + Send + '_>>;
}

/// Dump `pid`, falling back to the forced mode once if the default form
/// exits non-zero or hangs.
pub async fn dump_stacks<I>(invoker: &I, pid: u32) -> Result<String, DiagnosticsError>
where
    I: StackDumpInvoker + ?Sized,
{
    match invoker.invoke(pid, InvocationMode::Default).await {
        Ok(result) if result.success() => return Ok(result.stdout),
        Ok(result) => {
            debug!(
                pid,
                exit_code = ?result.code,
                stderr = %result.stderr.trim(),
                "default stack dump failed; retrying in forced mode"
            );
        }
        Err(DiagnosticsError::TimedOut(limit)) => {
            debug!(pid, ?limit, "default stack dump hung; retrying in forced mode");
        }
        Err(e) => return Err(e),
    }

    let forced = invoker.invoke(pid, InvocationMode::Forced).await?;
    if forced.success() {
        Ok(forced.stdout)
    } else {
        Err(DiagnosticsError::NonZeroExit {
            pid,
            code: forced.code,
            stderr: forced.stderr,
        })
    }
}

/// The real external tool, e.g. `jstack` with `-F` as its forced mode.
#[derive(Debug, Clone)]
pub struct StackDumpTool {
    program: PathBuf,
    args: Vec<String>,
    force_flag: Option<String>,
    invocation_timeout: Duration,
}

impl StackDumpTool {
    pub fn new(program: impl Into<PathBuf>, invocation_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            force_flag: None,
            invocation_timeout,
        }
    }

    /// Arguments placed before the pid (and before the force flag).
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Flag that selects forced mode. Without one, the fallback attempt is
    /// the default form again.
    pub fn with_force_flag(mut self, flag: impl Into<String>) -> Self {
        let flag = flag.into();
        self.force_flag = if flag.is_empty() { None } else { Some(flag) };
        self
    }

    /// Build from the `[diagnostics]` section using an already resolved
    /// executable path.
    pub fn from_settings(program: PathBuf, settings: &DiagnosticsSection) -> Self {
        Self::new(program, settings.invocation_timeout.as_duration())
            .with_args(settings.args.clone())
            .with_force_flag(settings.force_flag.clone())
    }

    fn command(&self, pid: u32, mode: InvocationMode) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let (InvocationMode::Forced, Some(flag)) = (mode, &self.force_flag) {
            cmd.arg(flag);
        }
        cmd.arg(pid.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, pid: u32, mode: InvocationMode) -> Result<InvocationResult, DiagnosticsError> {
        debug!(
            pid,
            ?mode,
            tool = %self.program.display(),
            "invoking stack-dump tool"
        );

        let child = self
            .command(pid, mode)
            .spawn()
            .map_err(|source| DiagnosticsError::Spawn {
                tool: self.program.display().to_string(),
                source,
            })?;

        // Drains stdout and stderr concurrently; on timeout the child is
        // dropped and killed.
        let output = tokio::time::timeout(self.invocation_timeout, child.wait_with_output())
            .await
            .map_err(|_| DiagnosticsError::TimedOut(self.invocation_timeout))??;

        Ok(InvocationResult {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl StackDumpInvoker for StackDumpTool {
    fn invoke(
        &self,
        pid: u32,
        mode: InvocationMode,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationResult, DiagnosticsError>> + Send + '_>> {
        Box::pin(self.run(pid, mode))
    }
}
