//! Integration tests for `tspaths mappings` and `tspaths version`.

use std::fs;
use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "tspaths-cli", "--bin", "tspaths", "--"]);
    cmd
}

#[test]
fn test_mappings_json_priority_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("paths.json"),
        r#"{
            "baseUrl": ".",
            "paths": {
                "*": ["vendor/*"],
                "@app/*": ["app/*"],
                "@app/core/*": ["core/*", "/opt/shared/core/*"]
            }
        }"#,
    )
    .unwrap();

    let output = cargo_bin()
        .args(["--json", "mappings", "--config", "paths.json", "--cwd"])
        .arg(dir.path())
        .output()
        .expect("Failed to run tspaths");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    let mappings = json["mappings"].as_array().expect("mappings array");

    let patterns: Vec<&str> = mappings
        .iter()
        .map(|m| m["pattern"].as_str().unwrap())
        .collect();
    assert_eq!(patterns, vec!["@app/core/*", "@app/*", "*"]);

    let core_paths: Vec<&str> = mappings[0]["paths"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert_eq!(
        core_paths,
        vec![
            dir.path().join("core/*").to_string_lossy().into_owned(),
            "/opt/shared/core/*".to_string(),
        ]
    );
}

#[test]
fn test_mappings_invalid_pattern_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("paths.json"),
        r#"{"baseUrl": ".", "paths": {"a/*/*": ["x/*"]}}"#,
    )
    .unwrap();

    let output = cargo_bin()
        .args(["mappings", "--config", "paths.json", "--cwd"])
        .arg(dir.path())
        .output()
        .expect("Failed to run tspaths");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("a/*/*"));
}

#[test]
fn test_version() {
    let output = cargo_bin()
        .arg("version")
        .output()
        .expect("Failed to run tspaths");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("tspaths "));
}
