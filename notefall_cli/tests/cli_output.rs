use std::{env, fs, path::PathBuf, process::Command};

fn norm_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("notefall_cli_{name}_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

const CHART_JSON: &str = r#"{
  "meta": { "title": "T", "artist": "A" },
  "mode": "keys4",
  "notes": [
    { "lane": 0, "start_ms": 1000, "type": "tap" },
    { "lane": 2, "start_ms": 1500, "type": "hold", "end_ms": 2000 },
    { "lane": 1, "start_ms": 2200, "type": "tap" }
  ]
}"#;

#[test]
fn simulate_autoplay_prints_result_json() {
    let exe = env!("CARGO_BIN_EXE_notefall_cli");
    let dir = scratch_dir("simulate");
    let chart = dir.join("chart.json");
    fs::write(&chart, CHART_JSON).unwrap();

    let out = Command::new(exe)
        .args(["simulate", chart.to_str().unwrap(), "--frame-ms", "8"])
        .output()
        .unwrap();

    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["passed"], true);
    assert_eq!(v["total_objects"], 3);
    assert_eq!(v["counts"]["Perfect"], 4);
    assert_eq!(v["max_combo"], 4);
}

#[test]
fn autoplay_then_inspect_and_simulate_replay() {
    let exe = env!("CARGO_BIN_EXE_notefall_cli");
    let dir = scratch_dir("autoplay");
    let chart = dir.join("chart.json");
    let replay = dir.join("perfect.nfr");
    fs::write(&chart, CHART_JSON).unwrap();

    let out = Command::new(exe)
        .args([
            "autoplay",
            chart.to_str().unwrap(),
            "-o",
            replay.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(replay.exists());

    let out = Command::new(exe)
        .args(["inspect", replay.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    assert!(stdout.contains("origin:    -3000ms"));
    assert!(stdout.contains("presses:   3"));
    assert!(stdout.contains("lanes:     3"));

    let out = Command::new(exe)
        .args([
            "simulate",
            chart.to_str().unwrap(),
            "--replay",
            replay.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["accuracy"], 100.0);
}

#[test]
fn invalid_chart_is_reported_with_context() {
    let exe = env!("CARGO_BIN_EXE_notefall_cli");
    let dir = scratch_dir("invalid");
    let chart = dir.join("bad.json");
    fs::write(
        &chart,
        r#"{ "mode": "keys4", "notes": [ { "lane": 9, "start_ms": 0, "type": "tap" } ] }"#,
    )
    .unwrap();

    let out = Command::new(exe)
        .args(["simulate", chart.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert_eq!(out.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("Error: invalid chart: "));
    assert!(stderr.contains("Caused by:"));
    assert!(stderr.contains("lane 9 is out of range"));
}

#[test]
fn corrupt_replay_is_rejected() {
    let exe = env!("CARGO_BIN_EXE_notefall_cli");
    let dir = scratch_dir("corrupt");
    let replay = dir.join("junk.nfr");
    fs::write(&replay, b"not a replay").unwrap();

    let out = Command::new(exe)
        .args(["inspect", replay.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!out.status.success());
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("Error: failed to decode replay:"));
    assert!(stderr.contains("missing replay magic header"));
}

#[test]
fn config_file_overrides_defaults() {
    let exe = env!("CARGO_BIN_EXE_notefall_cli");
    let dir = scratch_dir("config");
    let chart = dir.join("chart.json");
    let config = dir.join("config.json");
    fs::write(&chart, CHART_JSON).unwrap();
    fs::write(&config, r#"{ "modifiers": { "no_fail": true } }"#).unwrap();

    let out = Command::new(exe)
        .args([
            "simulate",
            chart.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["modifiers"]["no_fail"], true);
    assert_eq!(v["modifiers"]["autoplay"], true);
}

#[test]
fn help_mentions_subcommands() {
    let exe = env!("CARGO_BIN_EXE_notefall_cli");

    let output = Command::new(exe).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("simulate"));
    assert!(stdout.contains("autoplay"));
    assert!(stdout.contains("inspect"));
}
