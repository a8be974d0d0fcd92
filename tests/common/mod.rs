#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

pub use hangwatch_test_utils::init_tracing;

/// Writes a `/bin/sh` script that stands in for the stack-dump tool.
///
/// The script is run as `sh <script> [flag] <pid>`, so it never has to be
/// executable itself.
pub struct ToolScript {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl ToolScript {
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("creating temp dir");
        let path = dir.path().join("fake-stack-tool.sh");
        std::fs::write(&path, body).expect("writing tool script");
        Self { dir, path }
    }

    pub fn arg(&self) -> String {
        self.path.display().to_string()
    }

    /// Dumps successfully only when called with `-F`.
    pub fn needs_force() -> Self {
        Self::new(
            r#"
if [ "$1" = "-F" ]; then
  echo "forced dump of $2"
  exit 0
fi
echo "unable to attach to $1" >&2
exit 1
"#,
        )
    }

    /// Always dumps successfully with the default form.
    pub fn responsive() -> Self {
        Self::new(
            r#"
echo "\"main\" #1 prio=5 (pid $1)"
echo "   at work()"
exit 0
"#,
        )
    }
}
