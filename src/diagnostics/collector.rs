// src/diagnostics/collector.rs

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use tracing::{debug, error};

use super::sink::{DiagnosticSink, Rollback};
use super::tool::{StackDumpInvoker, dump_stacks};
use super::tree::ProcessTree;

/// What a single collection pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    /// Every process the traversal reached, in visit order.
    pub visited: Vec<u32>,
    /// Processes that got a block in the sink.
    pub captured: Vec<u32>,
    /// Processes whose dump or block write failed.
    pub failed: Vec<u32>,
}

/// Walks a process tree and appends one stack dump per process to a sink.
#[derive(Debug)]
pub struct DiagnosticCollector<I, T> {
    invoker: I,
    tree: Arc<T>,
}

impl<I, T> DiagnosticCollector<I, T>
where
    I: StackDumpInvoker,
    T: ProcessTree + 'static,
{
    pub fn new(invoker: I, tree: T) -> Self {
        Self {
            invoker,
            tree: Arc::new(tree),
        }
    }

    /// Process-table lookups block, so keep them off the timer threads.
    async fn children_of(&self, pid: u32) -> Vec<u32> {
        let tree = Arc::clone(&self.tree);
        match tokio::task::spawn_blocking(move || tree.children(pid)).await {
            Ok(children) => children,
            Err(e) => {
                error!(pid, error = %e, "child process lookup failed");
                Vec::new()
            }
        }
    }

    /// Depth-first, root before descendants.
    ///
    /// Per-process failures (tool errors, processes that exited mid-walk,
    /// sink write errors) are logged and skipped; they never end the walk.
    pub async fn collect<W>(&self, root: u32, sink: &mut DiagnosticSink<W>) -> CollectionReport
    where
        W: Write + Rollback + Send,
    {
        let mut report = CollectionReport::default();
        let mut seen = HashSet::new();
        let mut worklist = vec![root];

        while let Some(pid) = worklist.pop() {
            if !seen.insert(pid) {
                continue;
            }
            report.visited.push(pid);

            match dump_stacks(&self.invoker, pid).await {
                Ok(stacks) => match sink.append_block(pid, &stacks) {
                    Ok(()) => report.captured.push(pid),
                    Err(e) => {
                        error!(pid, error = %e, "could not write stack traces for process");
                        report.failed.push(pid);
                    }
                },
                Err(e) => {
                    error!(pid, error = %e, "could not collect stack traces for process");
                    report.failed.push(pid);
                }
            }

            let children = self.children_of(pid).await;
            debug!(pid, ?children, "discovered child processes");
            // Reversed so the lowest pid is visited first.
            worklist.extend(children.into_iter().rev());
        }

        report
    }
}
