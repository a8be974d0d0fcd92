// src/diagnostics/mod.rs

//! Best-effort stack dumps of a process and its descendants.
//!
//! - [`tool`]: external stack-dump tool with default/forced invocation.
//! - [`tree`]: process-tree introspection.
//! - [`sink`]: the append-only output file.
//! - [`capability`]: whether any of this works on the current host.
//! - [`collector`]: the tree walk that ties them together.
//!
//! [`Diagnostics`] is the seam the timeout handler calls when a deadline
//! fires.

use std::future::Future;
use std::pin::Pin;

use tracing::{Instrument, debug, error, error_span, info};

use crate::config::DiagnosticsSection;
use crate::interrupt::InterruptHandle;

pub mod capability;
pub mod collector;
pub mod sink;
pub mod tool;
pub mod tree;

pub use collector::{CollectionReport, DiagnosticCollector};
pub use sink::{BLOCK_SEPARATOR, DiagnosticSink, Rollback, render_block};
pub use tool::{InvocationMode, InvocationResult, StackDumpInvoker, StackDumpTool, dump_stacks};
pub use tree::{ProcessTree, SysinfoProcessTree};

/// Runs when a deadline fires, before the watched thread is interrupted.
///
/// Implementations must not fail or panic; anything that goes wrong is
/// logged.
pub trait Diagnostics: Send + Sync {
    fn capture<'a>(
        &'a self,
        target: &'a InterruptHandle,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Diagnostics turned off: firing only delivers the interrupt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    fn capture<'a>(
        &'a self,
        _target: &'a InterruptHandle,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}

/// Dumps the current process and all of its descendants with the configured
/// external tool, appending to the configured output file.
#[derive(Debug, Clone)]
pub struct StackDumpDiagnostics {
    settings: DiagnosticsSection,
}

impl StackDumpDiagnostics {
    pub fn new(settings: DiagnosticsSection) -> Self {
        Self { settings }
    }

    async fn capture_current_process(&self, target: &InterruptHandle) {
        // Per-process failures are logged deep in the walk; the span ties
        // them to the thread that timed out.
        let span = error_span!("stack_dump", thread = %target.describe());
        self.collect_into_output().instrument(span).await
    }

    async fn collect_into_output(&self) {
        let program = match capability::check(&self.settings.tool) {
            Ok(program) => program,
            Err(reason) => {
                debug!(%reason, "skipping stack dump collection");
                return;
            }
        };

        let output = &self.settings.output;
        let mut sink = match DiagnosticSink::open_append(output) {
            Ok(sink) => sink,
            Err(e) => {
                error!(
                    path = %output.display(),
                    error = %e,
                    "could not open stack dump output for timed out thread"
                );
                return;
            }
        };

        let collector = DiagnosticCollector::new(
            StackDumpTool::from_settings(program, &self.settings),
            SysinfoProcessTree::new(),
        );
        let report = collector.collect(std::process::id(), &mut sink).await;

        if let Err(e) = sink.finish() {
            error!(
                path = %output.display(),
                error = %e,
                "could not flush stack dump output"
            );
        }

        info!(
            path = %output.display(),
            visited = report.visited.len(),
            captured = report.captured.len(),
            failed = report.failed.len(),
            "collected stack traces for timed out thread"
        );
    }
}

impl Diagnostics for StackDumpDiagnostics {
    fn capture<'a>(
        &'a self,
        target: &'a InterruptHandle,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(self.capture_current_process(target))
    }
}
