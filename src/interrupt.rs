// src/interrupt.rs

//! Cooperative cancellation signal for worker threads.
//!
//! Rust threads cannot be stopped from the outside, so a firing timeout asks
//! the watched thread to stop: it raises a per-thread flag and unparks the
//! thread. Watched work is expected to poll [`is_interrupted`] / [`check`] or
//! wait through [`sleep`], which wakes up early when signalled.

use std::cell::OnceCell;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle, Thread};
use std::time::{Duration, Instant};

use thiserror::Error;

thread_local! {
    static FLAG: OnceCell<Arc<AtomicBool>> = const { OnceCell::new() };
}

fn current_flag() -> Arc<AtomicBool> {
    FLAG.with(|cell| Arc::clone(cell.get_or_init(|| Arc::new(AtomicBool::new(false)))))
}

/// Returned by worker-side helpers when the thread has been interrupted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("thread was interrupted")]
pub struct Interrupted;

/// A reference to a thread that can receive the cancellation signal.
///
/// Cheap to clone and safe to keep after the thread has exited; interrupting
/// a finished thread does nothing.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    thread: Thread,
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Handle for the calling thread.
    pub fn current() -> Self {
        Self {
            thread: thread::current(),
            flag: current_flag(),
        }
    }

    /// Deliver the cancellation signal.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.thread.unpark();
    }

    /// Whether a signal is pending on the target thread.
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    /// Human-readable thread identity for log lines.
    pub fn describe(&self) -> String {
        match self.thread.name() {
            Some(name) => format!("{name} ({:?})", self.thread.id()),
            None => format!("{:?}", self.thread.id()),
        }
    }
}

/// Spawn a named thread and return an interrupt handle for it alongside the
/// join handle.
pub fn spawn<F, T>(name: impl Into<String>, f: F) -> io::Result<(JoinHandle<T>, InterruptHandle)>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let flag = Arc::new(AtomicBool::new(false));
    let thread_flag = Arc::clone(&flag);

    let join = thread::Builder::new().name(name.into()).spawn(move || {
        FLAG.with(|cell| {
            // Fresh thread, so the cell is always empty here.
            let _ = cell.set(thread_flag);
        });
        f()
    })?;

    let handle = InterruptHandle {
        thread: join.thread().clone(),
        flag,
    };
    Ok((join, handle))
}

/// Whether the current thread has a pending signal. Does not clear it.
pub fn is_interrupted() -> bool {
    current_flag().load(Ordering::SeqCst)
}

/// Test and clear the current thread's signal.
pub fn interrupted() -> bool {
    current_flag().swap(false, Ordering::SeqCst)
}

/// `Err(Interrupted)` if the current thread has been signalled; clears the
/// signal.
pub fn check() -> Result<(), Interrupted> {
    if interrupted() { Err(Interrupted) } else { Ok(()) }
}

/// Sleep for `duration`, returning early with `Err(Interrupted)` if the
/// current thread is signalled. Clears the signal when it fires.
pub fn sleep(duration: Duration) -> Result<(), Interrupted> {
    let flag = current_flag();
    let deadline = Instant::now() + duration;

    loop {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(Interrupted);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        // Spurious wakeups are fine; the loop re-checks both conditions.
        thread::park_timeout(deadline - now);
    }
}
