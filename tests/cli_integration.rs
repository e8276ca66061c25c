//! Integration tests for the command-line interface
//!
//! Drives the built binary for scan, apply and restore.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn ctxsnap() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ctxsnap"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn run(args: &[&str]) -> Output {
    ctxsnap().args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Helper to create a test workspace
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/main.rs"),
        "fn main() {\n    println!(\"Hello\");\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("notes.log"), "noise\n").unwrap();
    dir
}

fn write_response(dir: &Path, body: &str) -> String {
    let path = dir.join("response.txt");
    fs::write(&path, body).unwrap();
    path.to_str().unwrap().to_string()
}

const HELLO_PATCH: &str = "\"src/main.rs\":
<<<<<<< SEARCH
println!(\"Hello\");
=======
println!(\"Hello, world\");
>>>>>>> REPLACE
";

#[test]
fn test_scan_help() {
    let output = run(&["scan", "--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Capture the workspace tree"));
}

#[test]
fn test_scan_prints_snapshot_json() {
    let workspace = setup_test_workspace();
    let root = workspace.path().to_str().unwrap();

    let output = run(&["scan", "--root", root, "--description", "demo"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["short_description"], "demo");
    assert_eq!(value["file_count"], 2);
    assert!(value["files"]["src/main.rs"]
        .as_str()
        .unwrap()
        .contains("Hello"));
    assert!(stderr(&output).contains("Scanned"));
}

#[test]
fn test_scan_only_and_output_file() {
    let workspace = setup_test_workspace();
    let root = workspace.path().to_str().unwrap();
    let out_dir = TempDir::new().unwrap();
    let out = out_dir.path().join("snap.json");

    let output = run(&[
        "scan",
        "--root",
        root,
        "--only",
        "src/main.rs",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    let files = value["files"].as_object().unwrap();
    assert_eq!(files.len(), 1);
    assert!(value["project_tree"].as_str().unwrap().contains("notes.log"));
}

#[test]
fn test_scan_uses_settings_file() {
    let workspace = setup_test_workspace();
    fs::write(
        workspace.path().join(".ctxsnap.toml"),
        "ignore = [\"*.log\"]\nworkers = 2\n",
    )
    .unwrap();

    let output = run(&["scan", "--root", workspace.path().to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!stdout(&output).contains("notes.log"));
}

#[test]
fn test_scan_rejects_invalid_settings() {
    let workspace = setup_test_workspace();
    fs::write(workspace.path().join(".ctxsnap.toml"), "workers = 0\n").unwrap();

    let output = run(&["scan", "--root", workspace.path().to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("workers"));
}

#[test]
fn test_scan_missing_root() {
    let output = run(&["scan", "--root", "/nonexistent/workspace"]);
    assert!(!output.status.success());
}

#[test]
fn test_apply_from_file() {
    let workspace = setup_test_workspace();
    let root = workspace.path().to_str().unwrap();
    let input = write_response(workspace.path(), HELLO_PATCH);

    let output = run(&["apply", "--root", root, "--input", &input]);
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("src/main.rs: Written"));
    assert!(out.contains("Summary:"));
    assert!(out.contains("Backup: "));

    let content = fs::read_to_string(workspace.path().join("src/main.rs")).unwrap();
    assert!(content.contains("Hello, world"));
    assert!(workspace.path().join(".ctxsnap/backups").is_dir());
}

#[test]
fn test_apply_from_stdin_without_backup() {
    let workspace = setup_test_workspace();
    let root = workspace.path().to_str().unwrap();

    let mut child = ctxsnap()
        .args(["apply", "--root", root, "--no-backup"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(HELLO_PATCH.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!workspace.path().join(".ctxsnap").exists());
    let content = fs::read_to_string(workspace.path().join("src/main.rs")).unwrap();
    assert!(content.contains("Hello, world"));
}

#[test]
fn test_apply_dry_run_with_diff() {
    let workspace = setup_test_workspace();
    let root = workspace.path().to_str().unwrap();
    let input = write_response(workspace.path(), HELLO_PATCH);
    let original = fs::read_to_string(workspace.path().join("src/main.rs")).unwrap();

    let output = run(&["apply", "--root", root, "--input", &input, "--dry-run", "--diff"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("DRY RUN"));
    assert!(out.contains("src/main.rs: Would update"));
    assert!(out.contains("+    println!(\"Hello, world\");"));
    assert!(out.contains("-    println!(\"Hello\");"));

    let after = fs::read_to_string(workspace.path().join("src/main.rs")).unwrap();
    assert_eq!(after, original);
    assert!(!workspace.path().join(".ctxsnap").exists());
}

#[test]
fn test_apply_conflict_exits_non_zero() {
    let workspace = setup_test_workspace();
    let root = workspace.path().to_str().unwrap();
    let input = write_response(
        workspace.path(),
        "\"src/main.rs\":\n<<<<<<< SEARCH\nnot there at all\n=======\nx\n>>>>>>> REPLACE\n",
    );

    let output = run(&["apply", "--root", root, "--input", &input]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("src/main.rs: Failed"));
    assert!(err.contains("CONFLICT"));
    assert!(err.contains("ctxsnap restore"));
}

#[test]
fn test_apply_rejects_unrecognized_response() {
    let workspace = setup_test_workspace();
    let root = workspace.path().to_str().unwrap();
    let input = write_response(workspace.path(), "I could not find anything to change.\n");

    let output = run(&["apply", "--root", root, "--input", &input]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no file changes"));
}

#[test]
fn test_restore_after_apply() {
    let workspace = setup_test_workspace();
    let root = workspace.path().to_str().unwrap();
    let input = write_response(workspace.path(), HELLO_PATCH);
    let original = fs::read_to_string(workspace.path().join("src/main.rs")).unwrap();

    let output = run(&["apply", "--root", root, "--input", &input]);
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    let id = out
        .lines()
        .find_map(|line| line.strip_prefix("Backup: "))
        .unwrap()
        .trim()
        .to_string();

    let output = run(&["restore", &id, "--root", root]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("src/main.rs: Restored"));

    let after = fs::read_to_string(workspace.path().join("src/main.rs")).unwrap();
    assert_eq!(after, original);
}

#[test]
fn test_restore_unknown_backup() {
    let workspace = setup_test_workspace();
    let output = run(&[
        "restore",
        "20000101T000000.000Z-00000000",
        "--root",
        workspace.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not found"));
}
