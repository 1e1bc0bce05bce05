use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// A config with an instant model and short navigation waits.
fn fast_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("focusfeed.yaml");
    fs::write(
        &path,
        "embedder:\n  warmup_ms: 0\nnavigation:\n  poll_interval_ms: 50\n  content_wait_ms: 500\n  content_poll_ms: 20\n",
    )
    .unwrap();
    path
}

fn focusfeed(config: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_focusfeed"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("RUST_LOG", "warn")
        .arg("--config")
        .arg(config)
        .args(["--output", "json"]);
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    serde_json::from_str(&stdout).expect("valid json")
}

fn count_tag(node: &Value, tag: &str) -> usize {
    let own = usize::from(node["tag"] == tag);
    own + node["children"]
        .as_array()
        .map(|children| children.iter().map(|c| count_tag(c, tag)).sum())
        .unwrap_or(0)
}

#[test]
fn run_filters_fixture_and_reports_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(&dir);
    let report = run_json(
        focusfeed(&config)
            .arg("run")
            .arg("--page")
            .arg(fixture("results.yaml"))
            .args(["--topic", "Trigonometry"]),
    );

    assert_eq!(report["topic"], "trigonometry");
    assert_eq!(report["active"], true);
    assert_eq!(report["settled"], true);
    let metrics = &report["metrics"];
    let scored = metrics["relevant"].as_u64().unwrap() + metrics["filtered"].as_u64().unwrap();
    assert_eq!(scored, 2);
    assert_eq!(metrics["skipped_empty"], 1);
    assert_eq!(metrics["sections_purged"], 1);
    assert_eq!(count_tag(&report["page"], "ytd-reel-shelf-renderer"), 0);
}

#[test]
fn run_derives_topic_and_follows_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(&dir);
    let report = run_json(
        focusfeed(&config)
            .arg("run")
            .arg("--page")
            .arg(fixture("results.yaml"))
            .args(["--navigate", "https://www.youtube.com/watch?v=trig101"])
            .arg("--fixture-after")
            .arg(fixture("watch.yaml"))
            .arg("--deactivate"),
    );

    assert_eq!(report["topic"], "trigonometry basics");
    assert_eq!(report["active"], false);
    assert_eq!(report["metrics"]["navigations"], 1);
    let page = &report["page"];
    assert_eq!(count_tag(page, "ytd-watch-next-secondary-results-renderer"), 0);
    // deactivation strips placeholders and markers
    let rendered = page.to_string();
    assert!(!rendered.contains("focusfeed-placeholder"));
    assert!(!rendered.contains("data-focusfeed"));
    assert!(!rendered.contains("focusfeed-topic-header"));
}

#[test]
fn config_show_prints_defaults_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    let value = run_json(focusfeed(&missing).args(["config", "show"]));
    assert_eq!(value["engine"]["threshold"], 0.5);
    assert_eq!(value["engine"]["unavailable_policy"], "hide");
    assert_eq!(value["selectors"]["page-container"][0], "ytd-app");
}

#[test]
fn config_validate_rejects_bad_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "engine:\n  threshold: 3.0\n").unwrap();
    focusfeed(&path)
        .args(["config", "validate"])
        .assert()
        .failure();

    let good = fast_config(&dir);
    focusfeed(&good)
        .args(["config", "validate"])
        .assert()
        .success();
}
