// src/timeout/executor.rs

//! Shared timer facility that runs deferred timeout actions.
//!
//! Deadlines sleep on a dedicated Tokio runtime, so they run on neither the
//! caller's thread nor the watched worker thread. Each scheduled task moves
//! through `Scheduled -> Running -> Done` or `Scheduled -> Cancelled`; both
//! transitions out of `Scheduled` are compare-and-swap, so exactly one of
//! "cancel" and "run" wins.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::config::ExecutorSection;
use crate::errors::{HangwatchError, Result};

const SCHEDULED: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;
const DONE: u8 = 3;

/// Lifecycle of one scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Scheduled,
    Running,
    Cancelled,
    Done,
}

impl TaskState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            SCHEDULED => TaskState::Scheduled,
            RUNNING => TaskState::Running,
            CANCELLED => TaskState::Cancelled,
            _ => TaskState::Done,
        }
    }
}

/// Handle to an action registered with [`ScheduledExecutor::schedule`].
#[derive(Debug)]
pub struct ScheduledTask {
    state: Arc<AtomicU8>,
    abort: AbortHandle,
}

impl ScheduledTask {
    /// Suppress the action if it has not started yet.
    ///
    /// Returns `true` if this call cancelled it. Once the action is running
    /// or finished this is a no-op and returns `false`.
    pub fn cancel(&self) -> bool {
        let won = self
            .state
            .compare_exchange(SCHEDULED, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if won {
            // Only the sleep is aborted; the action itself never started.
            self.abort.abort();
        }
        won
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_raw(self.state.load(Ordering::SeqCst))
    }
}

#[derive(Debug)]
struct Lifecycle {
    accepting: bool,
    running: usize,
    /// States of tasks that may still be waiting for their deadline.
    pending: Vec<Arc<AtomicU8>>,
}

#[derive(Debug)]
struct ExecutorState {
    lifecycle: Mutex<Lifecycle>,
    idle: Condvar,
}

impl ExecutorState {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a deferred action that is about to run, unless stopped.
    fn begin(self: &Arc<Self>) -> Option<InFlight> {
        let mut lifecycle = self.lock();
        if !lifecycle.accepting {
            return None;
        }
        lifecycle.running += 1;
        Some(InFlight {
            state: Arc::clone(self),
        })
    }
}

/// Counts a running action for the duration of its lifetime.
struct InFlight {
    state: Arc<ExecutorState>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut lifecycle = self.state.lock();
        lifecycle.running -= 1;
        if lifecycle.running == 0 {
            self.state.idle.notify_all();
        }
    }
}

/// Process-wide timer facility with explicit construction and teardown.
#[derive(Debug)]
pub struct ScheduledExecutor {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    state: Arc<ExecutorState>,
    shutdown_grace: Duration,
}

impl ScheduledExecutor {
    /// Start a timer facility backed by `worker_threads` named threads.
    pub fn new(worker_threads: usize, shutdown_grace: Duration) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("hangwatch-timer")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        debug!(worker_threads, ?shutdown_grace, "timer executor started");

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            handle,
            state: Arc::new(ExecutorState {
                lifecycle: Mutex::new(Lifecycle {
                    accepting: true,
                    running: 0,
                    pending: Vec::new(),
                }),
                idle: Condvar::new(),
            }),
            shutdown_grace,
        })
    }

    pub fn from_config(section: &ExecutorSection) -> Result<Self> {
        Self::new(section.worker_threads, section.shutdown_grace.as_duration())
    }

    /// Run `action` on a timer thread once `delay` has elapsed.
    ///
    /// Fails with [`HangwatchError::ExecutorStopped`] after [`stop`](Self::stop).
    pub fn schedule<F>(&self, delay: Duration, action: F) -> Result<ScheduledTask>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Held across the spawn so `stop()` cannot slip in between the check
        // and the registration.
        let mut lifecycle = self.state.lock();
        if !lifecycle.accepting {
            return Err(HangwatchError::ExecutorStopped);
        }

        let task_state = Arc::new(AtomicU8::new(SCHEDULED));
        lifecycle
            .pending
            .retain(|state| state.load(Ordering::SeqCst) == SCHEDULED);
        lifecycle.pending.push(Arc::clone(&task_state));
        let run_state = Arc::clone(&task_state);
        let executor_state = Arc::clone(&self.state);

        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(_in_flight) = executor_state.begin() else {
                debug!("timer executor stopped before deadline elapsed; dropping action");
                let _ = run_state.compare_exchange(
                    SCHEDULED,
                    CANCELLED,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                return;
            };

            if run_state
                .compare_exchange(SCHEDULED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }

            action.await;
            run_state.store(DONE, Ordering::SeqCst);
        });
        drop(lifecycle);

        Ok(ScheduledTask {
            state: task_state,
            abort: join.abort_handle(),
        })
    }

    /// Tear down the facility.
    ///
    /// No new work is accepted, pending deadlines are dropped (and report
    /// [`TaskState::Cancelled`]), and actions that are already running get up
    /// to the shutdown grace period to finish. Calling it again is a no-op. Must not be called from inside a
    /// deferred action.
    pub fn stop(&self) {
        let lifecycle = {
            let mut lifecycle = self.state.lock();
            if !lifecycle.accepting {
                return;
            }
            lifecycle.accepting = false;
            for state in lifecycle.pending.drain(..) {
                let _ =
                    state.compare_exchange(SCHEDULED, CANCELLED, Ordering::SeqCst, Ordering::SeqCst);
            }
            lifecycle
        };

        let (lifecycle, wait) = self
            .state
            .idle
            .wait_timeout_while(lifecycle, self.shutdown_grace, |l| l.running > 0)
            .unwrap_or_else(PoisonError::into_inner);
        if wait.timed_out() {
            warn!(
                running = lifecycle.running,
                grace_ms = self.shutdown_grace.as_millis() as u64,
                "timeout actions still running after shutdown grace period; abandoning them"
            );
        }
        drop(lifecycle);

        if let Some(runtime) = self.take_runtime() {
            runtime.shutdown_background();
        }
        info!("timer executor stopped");
    }

    fn take_runtime(&self) -> Option<Runtime> {
        self.runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Drop for ScheduledExecutor {
    fn drop(&mut self) {
        self.state.lock().accepting = false;
        if let Some(runtime) = self.take_runtime() {
            runtime.shutdown_background();
        }
    }
}
