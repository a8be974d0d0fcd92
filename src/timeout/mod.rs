// src/timeout/mod.rs

//! Wall-clock deadlines for work running on a dedicated thread.
//!
//! - [`executor`]: the shared timer facility.
//! - [`handle`]: [`Timeout`], the caller's view of one deadline.
//! - [`handler`]: [`DefaultTimeoutHandler`], which ties deadlines to
//!   diagnostics and the cooperative interrupt.

use std::time::Duration;

use crate::errors::Result;
use crate::interrupt::InterruptHandle;

pub mod executor;
pub mod handle;
pub mod handler;

pub use executor::{ScheduledExecutor, ScheduledTask, TaskState};
pub use handle::Timeout;
pub use handler::{Deadline, DefaultTimeoutHandler};

/// What the host engine uses to bound a unit of work.
pub trait TimeoutHandler: Send + Sync {
    /// Interrupt `thread` after `timeout` unless the returned handle is
    /// stopped first. Never blocks.
    fn start(&self, thread: InterruptHandle, timeout: Duration) -> Result<Timeout>;

    /// Shut down the underlying timer facility.
    fn stop(&self);
}
