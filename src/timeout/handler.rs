// src/timeout/handler.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::diagnostics::{Diagnostics, NoDiagnostics, StackDumpDiagnostics};
use crate::errors::Result;
use crate::interrupt::InterruptHandle;

use super::executor::ScheduledExecutor;
use super::handle::Timeout;
use super::TimeoutHandler;

/// A request to interrupt `target` once `duration` has elapsed.
#[derive(Debug, Clone)]
pub struct Deadline {
    pub target: InterruptHandle,
    pub duration: Duration,
}

/// Production [`TimeoutHandler`]: schedules deadlines on a
/// [`ScheduledExecutor`] and, when one fires, captures diagnostics before
/// interrupting the watched thread.
pub struct DefaultTimeoutHandler {
    executor: ScheduledExecutor,
    diagnostics: Arc<dyn Diagnostics>,
}

impl std::fmt::Debug for DefaultTimeoutHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultTimeoutHandler")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl DefaultTimeoutHandler {
    pub fn new(executor: ScheduledExecutor, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            executor,
            diagnostics,
        }
    }

    /// Build the executor and diagnostics from configuration.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let executor = ScheduledExecutor::from_config(&cfg.executor)?;
        let diagnostics: Arc<dyn Diagnostics> = if cfg.diagnostics.enabled {
            Arc::new(StackDumpDiagnostics::new(cfg.diagnostics.clone()))
        } else {
            Arc::new(NoDiagnostics)
        };
        Ok(Self::new(executor, diagnostics))
    }
}

impl TimeoutHandler for DefaultTimeoutHandler {
    fn start(&self, thread: InterruptHandle, timeout: Duration) -> Result<Timeout> {
        let deadline = Deadline {
            target: thread,
            duration: timeout,
        };
        debug!(
            thread = %deadline.target.describe(),
            timeout_ms = deadline.duration.as_millis() as u64,
            "starting timeout"
        );

        let fired = Arc::new(AtomicBool::new(false));
        let action = interrupt_on_timeout(deadline.clone(), Arc::clone(&fired), Arc::clone(&self.diagnostics));
        let task = self.executor.schedule(deadline.duration, action)?;

        Ok(Timeout::new(task, fired))
    }

    fn stop(&self) {
        self.executor.stop();
    }
}

/// The deferred action: flag, collect, then signal.
///
/// The flag is set first so that anyone woken by the signal already sees
/// `timed_out() == true`. Diagnostics run before the signal so they capture
/// the thread while it is still stuck.
async fn interrupt_on_timeout(
    deadline: Deadline,
    fired: Arc<AtomicBool>,
    diagnostics: Arc<dyn Diagnostics>,
) {
    fired.store(true, Ordering::SeqCst);

    warn!(
        thread = %deadline.target.describe(),
        timeout_ms = deadline.duration.as_millis() as u64,
        "timeout elapsed; interrupting thread"
    );

    diagnostics.capture(&deadline.target).await;

    deadline.target.interrupt();
}
