#![cfg(unix)]

mod common;
use crate::common::{ToolScript, init_tracing};

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use hangwatch::diagnostics::capability::{self, Unsupported};
use hangwatch::diagnostics::{
    DiagnosticCollector, DiagnosticSink, InvocationMode, ProcessTree, StackDumpInvoker,
    StackDumpTool, SysinfoProcessTree, dump_stacks,
};
use hangwatch::errors::DiagnosticsError;
use hangwatch_test_utils::wait_until;

fn sh_tool(script: &ToolScript, limit: Duration) -> StackDumpTool {
    StackDumpTool::new("/bin/sh", limit)
        .with_args(vec![script.arg()])
        .with_force_flag("-F")
}

#[tokio::test]
async fn default_invocation_captures_stdout() {
    init_tracing();
    let script = ToolScript::responsive();
    let tool = sh_tool(&script, Duration::from_secs(5));

    let result = tool.invoke(4242, InvocationMode::Default).await.unwrap();
    assert!(result.success());
    assert!(result.stdout.contains("(pid 4242)"));
    assert!(result.stdout.contains("at work()"));
}

#[tokio::test]
async fn forced_mode_is_used_when_default_fails() {
    init_tracing();
    let script = ToolScript::needs_force();
    let tool = sh_tool(&script, Duration::from_secs(5));

    let default = tool.invoke(77, InvocationMode::Default).await.unwrap();
    assert_eq!(default.code, Some(1));
    assert!(default.stderr.contains("unable to attach"));

    let stacks = dump_stacks(&tool, 77).await.unwrap();
    assert_eq!(stacks.trim(), "forced dump of 77");
}

#[tokio::test]
async fn both_forms_failing_reports_stderr() {
    init_tracing();
    let script = ToolScript::new("echo \"no such process $*\" >&2\nexit 3\n");
    let tool = sh_tool(&script, Duration::from_secs(5));

    match dump_stacks(&tool, 88).await {
        Err(DiagnosticsError::NonZeroExit { pid, code, stderr }) => {
            assert_eq!(pid, 88);
            assert_eq!(code, Some(3));
            assert!(stderr.contains("-F 88"));
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_force_flag_degrades_to_plain_retry() {
    init_tracing();
    let script = ToolScript::new("echo \"args: $*\" >&2\nexit 1\n");
    let tool = StackDumpTool::new("/bin/sh", Duration::from_secs(5))
        .with_args(vec![script.arg()])
        .with_force_flag("");

    let forced = tool.invoke(5, InvocationMode::Forced).await.unwrap();
    assert_eq!(forced.stderr.trim(), "args: 5");
}

#[tokio::test]
async fn hanging_tool_is_bounded_and_falls_back() {
    init_tracing();
    let script = ToolScript::new(
        r#"
if [ "$1" = "-F" ]; then
  echo "forced after hang"
  exit 0
fi
exec sleep 30
"#,
    );
    let tool = sh_tool(&script, Duration::from_millis(300));

    let started = Instant::now();
    let hung = tool.invoke(9, InvocationMode::Default).await;
    assert!(matches!(hung, Err(DiagnosticsError::TimedOut(_))));

    let stacks = dump_stacks(&tool, 9).await.unwrap();
    assert_eq!(stacks.trim(), "forced after hang");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn missing_tool_is_a_spawn_error() {
    init_tracing();
    let tool = StackDumpTool::new("/definitely/not/a/stack-tool", Duration::from_secs(1));

    let err = dump_stacks(&tool, 1).await.unwrap_err();
    assert!(matches!(err, DiagnosticsError::Spawn { .. }));
}

#[test]
fn capability_check_resolves_tools() {
    assert!(capability::check("sh").is_ok());
    assert_eq!(capability::check("/bin/sh").unwrap(), std::path::PathBuf::from("/bin/sh"));
    assert_eq!(
        capability::check("hangwatch-no-such-tool"),
        Err(Unsupported::ToolNotFound("hangwatch-no-such-tool".to_string()))
    );
}

/// Spawns `sh` with two sleeping children and kills everything on drop.
struct SleepyTree {
    parent: std::process::Child,
}

impl SleepyTree {
    fn spawn() -> Self {
        let parent = Command::new("/bin/sh")
            .arg("-c")
            .arg("sleep 30 & sleep 30 & wait")
            .stdout(Stdio::null())
            .spawn()
            .expect("spawning process tree");
        Self { parent }
    }

    fn pid(&self) -> u32 {
        self.parent.id()
    }
}

impl Drop for SleepyTree {
    fn drop(&mut self) {
        let tree = SysinfoProcessTree::new();
        for child in tree.children(self.pid()) {
            let _ = Command::new("kill").arg(child.to_string()).status();
        }
        let _ = self.parent.kill();
        let _ = self.parent.wait();
    }
}

#[test]
fn sysinfo_tree_lists_direct_children() {
    init_tracing();
    let sleepy = SleepyTree::spawn();
    let tree = SysinfoProcessTree::new();

    assert!(wait_until(Duration::from_secs(5), || tree.children(sleepy.pid()).len() == 2));
    assert!(tree.children(u32::MAX - 1).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn real_tree_collection_writes_one_block_per_process() {
    init_tracing();
    let sleepy = SleepyTree::spawn();
    let tree = SysinfoProcessTree::new();
    assert!(wait_until(Duration::from_secs(5), || tree.children(sleepy.pid()).len() == 2));
    let children = tree.children(sleepy.pid());

    let script = ToolScript::responsive();
    let out_path = script.dir.path().join("stacks.txt");
    std::fs::write(&out_path, "previous run\n").unwrap();

    let collector = DiagnosticCollector::new(sh_tool(&script, Duration::from_secs(5)), tree);
    let mut sink = DiagnosticSink::open_append(&out_path).unwrap();
    let report = collector.collect(sleepy.pid(), &mut sink).await;
    sink.finish().unwrap();

    let output = std::fs::read_to_string(&out_path).unwrap();
    assert!(output.starts_with("previous run\n"), "sink must append, not truncate");
    assert_eq!(report.captured.len(), 3);
    for pid in std::iter::once(sleepy.pid()).chain(children) {
        assert!(output.contains(&format!("Process {pid}\n")));
        assert!(output.contains(&format!("(pid {pid})")));
    }
}
