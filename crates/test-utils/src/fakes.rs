//! In-memory stand-ins for the process-facing collaborators.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hangwatch::diagnostics::{
    Diagnostics, InvocationMode, InvocationResult, ProcessTree, StackDumpInvoker,
};
use hangwatch::errors::DiagnosticsError;
use hangwatch::interrupt::InterruptHandle;

/// Scripted behaviour of the stack-dump tool for one pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeDump {
    /// Default invocation succeeds.
    Responsive,
    /// Default exits non-zero, forced succeeds.
    NeedsForce,
    /// Both invocations exit non-zero.
    Broken,
    /// The process is gone; the tool cannot attach.
    Exited,
}

/// A stack-dump tool that answers from a script and records every call.
#[derive(Debug, Clone, Default)]
pub struct FakeStackDumper {
    script: HashMap<u32, FakeDump>,
    calls: Arc<Mutex<Vec<(u32, InvocationMode)>>>,
}

impl FakeStackDumper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pid: u32, behaviour: FakeDump) -> Self {
        self.script.insert(pid, behaviour);
        self
    }

    /// Shared view of the recorded calls.
    pub fn calls(&self) -> Arc<Mutex<Vec<(u32, InvocationMode)>>> {
        Arc::clone(&self.calls)
    }

    fn answer(&self, pid: u32, mode: InvocationMode) -> InvocationResult {
        let behaviour = self.script.get(&pid).copied().unwrap_or(FakeDump::Exited);
        let ok = match (behaviour, mode) {
            (FakeDump::Responsive, _) => true,
            (FakeDump::NeedsForce, InvocationMode::Forced) => true,
            _ => false,
        };

        if ok {
            InvocationResult {
                code: Some(0),
                stdout: format!("\"main\" stacks of {pid} ({mode:?})\n"),
                stderr: String::new(),
            }
        } else {
            InvocationResult {
                code: Some(1),
                stdout: String::new(),
                stderr: format!("{pid}: unable to attach ({mode:?})"),
            }
        }
    }
}

impl StackDumpInvoker for FakeStackDumper {
    fn invoke(
        &self,
        pid: u32,
        mode: InvocationMode,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationResult, DiagnosticsError>> + Send + '_>> {
        self.calls.lock().unwrap().push((pid, mode));
        let result = self.answer(pid, mode);
        Box::pin(async move { Ok(result) })
    }
}

/// A fixed parent -> children table.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessTree {
    children: HashMap<u32, Vec<u32>>,
}

impl FakeProcessTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, parent: u32, children: &[u32]) -> Self {
        self.children.insert(parent, children.to_vec());
        self
    }
}

impl ProcessTree for FakeProcessTree {
    fn children(&self, pid: u32) -> Vec<u32> {
        self.children.get(&pid).cloned().unwrap_or_default()
    }
}

/// What a [`RecordingDiagnostics`] saw when it was invoked.
#[derive(Debug, Clone)]
pub struct Capture {
    pub thread: String,
    /// Whether the target was already interrupted when diagnostics ran.
    pub already_interrupted: bool,
}

/// Diagnostics that record each call and optionally take a while.
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    captures: Arc<Mutex<Vec<Capture>>>,
    started: Arc<AtomicUsize>,
    delay: Duration,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every capture take `delay` (async sleep on the timer thread).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn captures(&self) -> Vec<Capture> {
        self.captures.lock().unwrap().clone()
    }

    /// Number of captures that have started, including unfinished ones.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn capture<'a>(
        &'a self,
        target: &'a InterruptHandle,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.started.fetch_add(1, Ordering::SeqCst);
            let capture = Capture {
                thread: target.describe(),
                already_interrupted: target.is_interrupted(),
            };
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.captures.lock().unwrap().push(capture);
        })
    }
}
