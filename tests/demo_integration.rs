//! Demo binary integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn demo_cmd() -> Command {
    Command::cargo_bin("fanlog-demo").expect("Failed to find fanlog-demo binary")
}

#[test]
fn test_memory_sink_respects_level() {
    demo_cmd()
        .args(["--sinks", "memory", "--level", "warn"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warn  slow response: 950 ms"))
        .stdout(predicate::str::contains("Error request req-7 failed"))
        .stdout(predicate::str::contains("Fatal worker pool exhausted"))
        .stdout(predicate::str::contains("listening on port").not());
}

#[test]
fn test_small_ring_keeps_newest() {
    demo_cmd()
        .args(["--sinks", "memory", "--capacity", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("request req-7 failed"))
        .stdout(predicate::str::contains("worker pool exhausted"))
        .stdout(predicate::str::contains("slow response").not());
}

#[test]
fn test_file_sink_and_config() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("demo.log");
    let config_path = dir.path().join("fanlog.json");
    std::fs::write(&config_path, r#"{ "level": "error", "color": "never" }"#).unwrap();

    demo_cmd()
        .args(["--sinks", "file", "--config"])
        .arg(&config_path)
        .arg("--file")
        .arg(&log_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("memory sink not enabled"));

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains("main.rs >> run() >> in line["));
}

#[test]
fn test_unknown_sink_is_rejected() {
    demo_cmd()
        .args(["--sinks", "printer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown sink kind"));
}
