// src/timeout/handle.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::executor::{ScheduledTask, TaskState};

/// One outstanding deadline, as handed back by
/// [`TimeoutHandler::start`](super::TimeoutHandler::start).
///
/// Dropping the handle cancels the deadline if it has not fired yet, so keep
/// it alive for as long as the watched work runs.
#[must_use = "dropping a Timeout cancels the deadline"]
#[derive(Debug)]
pub struct Timeout {
    task: ScheduledTask,
    fired: Arc<AtomicBool>,
}

impl Timeout {
    pub(crate) fn new(task: ScheduledTask, fired: Arc<AtomicBool>) -> Self {
        Self { task, fired }
    }

    /// Cancel the deadline.
    ///
    /// If the deferred action has already started (or finished) it is left
    /// to complete. Safe to call repeatedly and from any thread.
    pub fn stop(&self) {
        self.task.cancel();
    }

    /// Whether the deadline elapsed. Once `true`, stays `true`.
    pub fn timed_out(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Where the underlying scheduled action currently is.
    pub fn state(&self) -> TaskState {
        self.task.state()
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.task.cancel();
    }
}
