//! End-to-end CLI checks against a temporary home directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn shapesync(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shapesync").expect("binary");
    cmd.env("HOME", home.path()).env("USERPROFILE", home.path());
    cmd
}

fn shape_file(dir: &std::path::Path, name: &str, component_type: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let shape = json!({
        "brandId": "17",
        "sectionId": "4",
        "genreId": "2",
        "shapeTypeId": "lead",
        "foldLine": 180,
        "textComponents": [{
            "type": component_type,
            "firstParagraphStyle": "Kop-1",
            "frames": [{"x": 12.0, "y": 10.0, "width": 368.5, "height": 40.0, "wrapMode": "none"}],
        }],
        "imageComponents": [],
    });
    std::fs::write(&path, shape.to_string()).unwrap();
    path
}

#[test]
fn init_writes_config_and_refuses_silent_overwrite() {
    let home = TempDir::new().unwrap();

    shapesync(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("config.yaml"));
    assert!(home.path().join(".shapesync").join("config.yaml").exists());

    shapesync(&home)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    shapesync(&home).arg("init").arg("--force").assert().success();
}

#[test]
fn hash_is_stable_and_applies_label_rules() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    shapesync(&home).arg("init").assert().success();

    // "Headline" maps through the sample config's head(line)? rule, so it
    // must hash identically to the standard label.
    let custom = shape_file(work.path(), "custom.json", "Headline");
    let standard = shape_file(work.path(), "standard.json", "headline");

    let first = shapesync(&home).arg("hash").arg(&custom).output().unwrap();
    let second = shapesync(&home).arg("hash").arg(&standard).output().unwrap();
    assert!(first.status.success());
    let first = String::from_utf8(first.stdout).unwrap();
    let second = String::from_utf8(second.stdout).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.trim().len(), 64, "expected a hex SHA-256: {first}");

    shapesync(&home)
        .arg("hash")
        .arg(&custom)
        .arg("--canonical")
        .assert()
        .success()
        .stdout(predicate::str::contains("textComponents"));
}

#[test]
fn hash_rejects_unknown_fields() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let path = shape_file(work.path(), "bad.json", "body");
    let mut raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    raw["extraFlag"] = json!(true);
    std::fs::write(&path, raw.to_string()).unwrap();

    shapesync(&home)
        .arg("hash")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("extraFlag"));
}

#[test]
fn ledger_lists_newest_versions_and_prunes_stale_files() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    std::fs::write(work.path().join("X (100.v1.0).json"), b"x").unwrap();
    std::fs::write(work.path().join("X (100.v2.0).json"), b"x").unwrap();
    std::fs::write(work.path().join("Y (200.v4.1).json"), b"x").unwrap();

    shapesync(&home)
        .arg("ledger")
        .arg(work.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("100").and(predicate::str::contains("2.0")));
    assert!(
        !work.path().join("X (100.v1.0).json").exists(),
        "stale version must be pruned"
    );

    let output = shapesync(&home)
        .arg("ledger")
        .arg(work.path())
        .arg("--json")
        .output()
        .unwrap();
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 2);
    assert_eq!(entries[0]["layoutId"], json!("100"));
    assert_eq!(entries[0]["version"], json!("2.0"));
}

#[test]
fn reconcile_requires_config_then_session() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    shapesync(&home)
        .arg("reconcile")
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("config not found"));

    shapesync(&home).arg("init").assert().success();
    shapesync(&home)
        .arg("reconcile")
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("shapesync login"));
}
