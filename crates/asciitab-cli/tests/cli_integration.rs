//! Integration tests for the asciitab CLI

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::tempdir;

fn run_asciitab(dir: &Path, args: &[&str], stdin: &str) -> (String, String, bool) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_asciitab"))
        .arg("--dir")
        .arg(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for command");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn pair_count(line: &str) -> usize {
    line.matches(" , ").count()
}

#[test]
fn test_cli_help() {
    let tmp = tempdir().unwrap();
    let (stdout, _, success) = run_asciitab(tmp.path(), &["--help"], "");

    assert!(success);
    assert!(stdout.contains("asciitab"));
    assert!(stdout.contains("--dir"));
    assert!(stdout.contains("--drop-empty-rows"));
    assert!(stdout.contains("list"));
    assert!(stdout.contains("export"));
}

#[test]
fn test_new_table_session() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("text files");
    let (stdout, _, success) = run_asciitab(&dir, &[], "demo\n2x2\nprint\nx\n");

    assert!(success);
    assert!(stdout.contains("Created new file: demo.txt"));
    assert!(stdout.contains("Table Contents:"));
    assert!(stdout.contains("Exiting..."));

    let content = fs::read_to_string(dir.join("demo.txt")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| pair_count(line) == 2));
}

#[test]
fn test_sort_existing_table() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("t.txt"), "(k1 , v1) (k2 , v2)\n(k3 , v3)\n").unwrap();

    let (stdout, _, success) = run_asciitab(tmp.path(), &["t"], "sort\n1\ndesc\nx\n");

    assert!(success);
    assert!(stdout.contains("Found existing file: t.txt"));
    assert!(stdout.contains("Row 1 sorted in DESC order."));
    assert_eq!(
        fs::read_to_string(tmp.path().join("t.txt")).unwrap(),
        "(k2 , v2) (k1 , v1)\n(k3 , v3)\n"
    );
}

#[test]
fn test_search_reports_occurrences() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("t.txt"), "(aaa , b) (c , aa)\n").unwrap();

    let (stdout, _, success) = run_asciitab(tmp.path(), &["t.txt"], "search\naa\nx\n");

    assert!(success);
    assert!(stdout.contains("2 <aa> occurrence/s at key of [0,0]"));
    assert!(stdout.contains("1 <aa> occurrence/s at value of [0,1]"));
}

#[test]
fn test_end_of_input_exits_cleanly() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("t.txt"), "(a , 1)\n").unwrap();

    let (stdout, _, success) = run_asciitab(tmp.path(), &["t"], "print\n");

    assert!(success);
    assert!(stdout.contains("(a , 1)"));
}

#[test]
fn test_history_written_on_exit() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("t.txt"), "(a , 1) (b , 2)\n").unwrap();
    let history = tmp.path().join("history.json");

    let (_, _, success) = run_asciitab(
        tmp.path(),
        &["t", "--history", history.to_str().unwrap()],
        "sort\n1\ndesc\nx\n",
    );

    assert!(success);
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&history).unwrap()).expect("Invalid JSON");
    let entries = parsed["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["action"]["action"], "sort");
}

#[test]
fn test_list_tables() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("b.txt"), "").unwrap();
    fs::write(tmp.path().join("a.txt"), "").unwrap();
    fs::write(tmp.path().join("readme.md"), "").unwrap();

    let (stdout, _, success) = run_asciitab(tmp.path(), &["list"], "");

    assert!(success);
    assert!(stdout.contains("(2):"));
    assert!(stdout.contains("  a.txt\n  b.txt"));
    assert!(!stdout.contains("readme.md"));
}

#[test]
fn test_export_json() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("t.txt"), "(k1 , v1) (k2 , v2)\n(k3 , v3)\n").unwrap();

    let (stdout, _, success) = run_asciitab(tmp.path(), &["export", "t", "--format", "json"], "");

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");
    let rows = parsed["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["cells"][1]["key"], "k2");
    assert_eq!(rows[1]["cells"][0]["value"], "v3");
}

#[test]
fn test_export_unknown_format_fails() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("t.txt"), "(a , 1)\n").unwrap();

    let (_, stderr, success) = run_asciitab(tmp.path(), &["export", "t", "--format", "csv"], "");

    assert!(!success);
    assert!(stderr.contains("unknown format 'csv'"));
}
