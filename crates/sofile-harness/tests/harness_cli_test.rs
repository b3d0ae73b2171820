//! Integration tests: harness binary end to end.
//!
//! Run: cargo test -p sofile-harness --test harness_cli_test

use std::path::PathBuf;
use std::process::Command;

use sofile_harness::structured_log::validate_log_file;

fn harness() -> Command {
    Command::new(env!("CARGO_BIN_EXE_harness"))
}

fn out_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sofile-cli-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn run_writes_log_report_and_index() {
    let dir = out_dir("run");
    let log = dir.join("run.log.jsonl");
    let report = dir.join("report.json");
    let index = dir.join("index.json");

    let status = harness()
        .args(["run", "--run-id", "cli", "--filter", "tell"])
        .arg("--log")
        .arg(&log)
        .arg("--report")
        .arg(&report)
        .arg("--artifact-index")
        .arg(&index)
        .arg("--scratch")
        .arg(dir.join("scratch"))
        .status()
        .expect("spawn harness");
    assert!(status.success());

    let (lines, errors) = validate_log_file(&log).unwrap();
    assert!(errors.is_empty(), "{errors:?}");
    assert!(lines >= 3);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["run_id"], "cli");
    assert_eq!(report["failed"], 0);
    assert!(
        report["results"]
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["operation"] == "tell")
    );

    let index: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&index).unwrap()).unwrap();
    let artifacts = index["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 2);
    assert_eq!(artifacts[0]["kind"], "log");
    assert_eq!(artifacts[0]["sha256"].as_str().unwrap().len(), 64);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn list_prints_every_scenario() {
    let out = harness().arg("list").output().expect("spawn harness");
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    for scenario in sofile_harness::catalog() {
        assert!(text.contains(scenario.name), "missing {}", scenario.name);
    }
}

#[test]
fn copy_round_trips_file() {
    let dir = out_dir("copy");
    let src = dir.join("src");
    let dst = dir.join("dst");
    let data: Vec<u8> = (0..9000u32).map(|i| (i % 199) as u8).collect();
    std::fs::write(&src, &data).unwrap();

    let status = harness().arg("copy").arg(&src).arg(&dst).status().unwrap();
    assert!(status.success());
    assert_eq!(std::fs::read(&dst).unwrap(), data);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn spawn_echoes_output_and_propagates_exit_code() {
    let out = harness().args(["spawn", "echo hello"]).output().unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, b"hello\n");

    let out = harness().args(["spawn", "exit 6"]).output().unwrap();
    assert_eq!(out.status.code(), Some(6));
}

#[test]
fn unmatched_filter_fails() {
    let dir = out_dir("nofilter");
    let status = harness()
        .args(["run", "--filter", "no-such-scenario", "--log"])
        .arg(dir.join("log.jsonl"))
        .arg("--scratch")
        .arg(dir.join("scratch"))
        .status()
        .unwrap();
    assert!(!status.success());
    let _ = std::fs::remove_dir_all(&dir);
}
