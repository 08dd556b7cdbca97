//! End-to-end tests for the factura binary (no network involved).

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use zip::write::SimpleFileOptions;

fn sample_zip(names: &[&str]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for name in names {
        writer.start_file(*name, options).unwrap();
        writer.write_all(b"fake").unwrap();
    }

    writer.finish().unwrap().into_inner()
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("factura")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn process_without_inputs_fails() {
    Command::cargo_bin("factura")
        .unwrap()
        .arg("process")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Select at least one input"));
}

#[test]
fn inspect_reports_valid_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.zip");
    std::fs::write(&path, sample_zip(&["a.jpg", "b.PDF", "notes.txt"])).unwrap();

    Command::cargo_bin("factura")
        .unwrap()
        .args(["inspect", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 valid document(s)"));
}

#[test]
fn inspect_warns_when_archive_exceeds_cycle_limit() {
    let names: Vec<String> = (0..16).map(|i| format!("f{i}.png")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.zip");
    std::fs::write(&path, sample_zip(&name_refs)).unwrap();

    Command::cargo_bin("factura")
        .unwrap()
        .args(["inspect", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("exceeds the per-cycle limit"));
}

#[test]
fn inspect_rejects_corrupt_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.zip");
    std::fs::write(&path, b"this is not a zip").unwrap();

    Command::cargo_bin("factura")
        .unwrap()
        .args(["inspect", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read the ZIP archive"));
}
