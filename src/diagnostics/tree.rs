// src/diagnostics/tree.rs

use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

/// Live process-tree introspection.
pub trait ProcessTree: Send + Sync {
    /// Direct children of `pid` as of now. Empty if `pid` has exited.
    fn children(&self, pid: u32) -> Vec<u32>;
}

/// [`ProcessTree`] backed by `sysinfo`.
///
/// The process table is refreshed on every lookup, so children spawned or
/// reaped during a traversal are seen as they are at that moment.
#[derive(Debug)]
pub struct SysinfoProcessTree {
    system: Mutex<System>,
}

impl SysinfoProcessTree {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing()),
        );
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoProcessTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTree for SysinfoProcessTree {
    fn children(&self, pid: u32) -> Vec<u32> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        let parent = Pid::from_u32(pid);
        let mut children: Vec<u32> = system
            .processes()
            .iter()
            // On Linux, threads show up as processes too.
            .filter(|(_, process)| process.thread_kind().is_none())
            .filter(|(_, process)| process.parent() == Some(parent))
            .map(|(child, _)| child.as_u32())
            .collect();
        children.sort_unstable();
        children
    }
}
