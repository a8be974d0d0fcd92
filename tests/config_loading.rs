use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use hangwatch::config::{load_and_validate, load_or_default};
use hangwatch::errors::HangwatchError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn empty_file_uses_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.executor.worker_threads, 1);
    assert_eq!(cfg.executor.shutdown_grace.as_duration(), Duration::from_secs(5));
    assert!(cfg.diagnostics.enabled);
    assert_eq!(cfg.diagnostics.tool, "jstack");
    assert_eq!(cfg.diagnostics.force_flag, "-F");
    assert_eq!(cfg.diagnostics.invocation_timeout.as_duration(), Duration::from_secs(10));
}

#[test]
fn full_file_is_parsed() {
    let file = write_config(
        r#"
[executor]
worker_threads = 4
shutdown_grace = "250ms"

[diagnostics]
tool = "/opt/jdk/bin/jstack"
args = ["-l"]
force_flag = ""
invocation_timeout = "2m"
output = "/tmp/stacks.txt"
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.executor.worker_threads, 4);
    assert_eq!(cfg.executor.shutdown_grace.as_duration(), Duration::from_millis(250));
    assert_eq!(cfg.diagnostics.args, vec!["-l".to_string()]);
    assert!(cfg.diagnostics.force_flag.is_empty());
    assert_eq!(cfg.diagnostics.invocation_timeout.as_duration(), Duration::from_secs(120));
}

#[test]
fn zero_worker_threads_is_a_config_error() {
    let file = write_config("[executor]\nworker_threads = 0\n");

    match load_and_validate(file.path()) {
        Err(HangwatchError::ConfigError(msg)) => assert!(msg.contains("worker_threads")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn zero_invocation_timeout_is_rejected_only_when_enabled() {
    let enabled = write_config("[diagnostics]\ninvocation_timeout = \"0s\"\n");
    assert!(matches!(
        load_and_validate(enabled.path()),
        Err(HangwatchError::ConfigError(_))
    ));

    let disabled = write_config("[diagnostics]\nenabled = false\ninvocation_timeout = \"0s\"\n");
    assert!(load_and_validate(disabled.path()).is_ok());
}

#[test]
fn bad_duration_is_a_toml_error() {
    let file = write_config("[executor]\nshutdown_grace = \"5 fortnights\"\n");

    match load_and_validate(file.path()) {
        Err(HangwatchError::TomlError(e)) => assert!(e.to_string().contains("unsupported duration unit")),
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config("[diagnostics]\ntoool = \"jstack\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(HangwatchError::TomlError(_))
    ));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("Hangwatch.toml")).unwrap();
    assert_eq!(cfg.executor.worker_threads, 1);

    assert!(matches!(
        load_and_validate(dir.path().join("Hangwatch.toml")),
        Err(HangwatchError::IoError(_))
    ));
}
