mod common;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

use common::*;

fn cmd() -> Command {
    Command::cargo_bin("citypersons2voc").unwrap()
}

fn convert_cmd(fixture: &Fixture) -> Command {
    let mut cmd = cmd();
    cmd.arg("convert")
        .arg("--train-annotations")
        .arg(&fixture.train_json)
        .arg("--val-annotations")
        .arg(&fixture.val_json)
        .arg("--image-root")
        .arg(&fixture.image_root)
        .arg("--output")
        .arg(&fixture.output)
        .env_remove("CITYPERSONS2VOC_CONFIG");
    cmd
}

#[test]
fn runs() {
    cmd().assert().success();
}

#[test]
fn outputs_tool_name() {
    cmd()
        .arg("-V")
        .assert()
        .success()
        .stdout("citypersons2voc 0.1.0\n");
}

#[test]
fn print_config_emits_default_yaml() {
    cmd()
        .arg("print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("class_map:"))
        .stdout(predicate::str::contains("width_range:"))
        .stdout(predicate::str::contains("on_existing: abort"));
}

#[test]
fn convert_prints_text_report() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());

    convert_cmd(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("CityPersons to VOC conversion"))
        .stdout(predicate::str::contains("train (filter enabled):"))
        .stdout(predicate::str::contains("written images:  2"));

    assert!(fixture
        .output
        .join("data/ImageSets/Main/train.txt")
        .is_file());
}

#[test]
fn convert_prints_json_report() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());

    let output = convert_cmd(&fixture)
        .args(["--report", "json"])
        .output()
        .expect("run convert");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["splits"][0]["split"], "train");
    assert_eq!(report["splits"][0]["written_images"], 2);
    assert_eq!(report["splits"][1]["split"], "val");
    assert_eq!(report["handle_ignore"], true);
}

#[test]
fn range_flags_override_defaults() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());

    convert_cmd(&fixture)
        .args(["--width-range", "none", "--vis-range", "none"])
        .assert()
        .success()
        .stdout(predicate::str::contains("width range:      none"));

    // Without ranges only the empty train image is skipped.
    let train = fs::read_to_string(fixture.output.join("data/ImageSets/Main/train.txt")).unwrap();
    assert_eq!(train.lines().count(), 3);
}

#[test]
fn config_file_is_applied_and_flags_win() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());
    let config = temp.path().join("run.yaml");
    fs::write(
        &config,
        "filter:\n  enable_val: true\n  width_range: [100, .inf]\ncopy_images: true\n",
    )
    .unwrap();

    convert_cmd(&fixture)
        .arg("--config")
        .arg(&config)
        .args(["--width-range", "10:inf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("val (filter enabled):"))
        .stdout(predicate::str::contains("width range:      (10, inf]"))
        .stdout(predicate::str::contains("copy images: true"));
}

#[test]
fn existing_output_fails_with_hint() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());
    fs::create_dir_all(&fixture.output).unwrap();

    convert_cmd(&fixture)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Output directory already exists"))
        .stderr(predicate::str::contains("--on-existing recreate"));
}

#[test]
fn recreate_flag_replaces_output() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());
    fs::create_dir_all(&fixture.output).unwrap();
    fs::write(fixture.output.join("stale.txt"), "old").unwrap();

    convert_cmd(&fixture)
        .args(["--on-existing", "recreate"])
        .assert()
        .success();
    assert!(!fixture.output.join("stale.txt").exists());
}

#[test]
fn missing_val_directory_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());
    fs::remove_dir_all(fixture.image_root.join("val")).unwrap();

    convert_cmd(&fixture)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Image directory not found"));
    assert!(!fixture.output.exists());
}

#[test]
fn invalid_range_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());

    convert_cmd(&fixture)
        .args(["--width-range", "50:10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lower bound"));
}

#[test]
fn missing_annotation_source_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp.path());
    fs::remove_file(&fixture.train_json).unwrap();

    convert_cmd(&fixture)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: IO error"));
}
