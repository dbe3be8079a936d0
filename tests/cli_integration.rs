//! Integration tests for the `onetree` CLI.
//!
//! Each test runs `onetree` as a subprocess in a temp directory against the
//! fixture snapshot and checks stdout and the exit status.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pretty_assertions::assert_eq;

/// Get the path to the built `onetree` binary.
fn onetree_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_onetree"))
}

fn fixture() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/hierarchy.xml")
        .to_string_lossy()
        .into_owned()
}

/// Run `onetree` and return (stdout, stderr, success).
fn run(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(onetree_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run onetree");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run(dir, args);
    if !success {
        panic!(
            "onetree {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

// ---------------------------------------------------------------------------
// stats / tree
// ---------------------------------------------------------------------------

#[test]
fn test_stats() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["stats", &fixture()]);
    insta::assert_snapshot!(out.trim_end(), @r"
    notebooks           4
    section groups      7
    sections           22
    pages              31
    ");
}

#[test]
fn test_stats_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["stats", &fixture(), "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["notebooks"], 4);
    assert_eq!(json["section_groups"], 7);
    assert_eq!(json["sections"], 22);
    assert_eq!(json["pages"], 31);
}

#[test]
fn test_tree() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["tree", &fixture()]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "[N] It's A Notebook (Its A Notebook)");
    assert_eq!(lines[1], "  [S] Section A");
    assert!(out.contains("  [S] Locked Section <locked, encrypted>"));
    assert!(out.contains("            [P] Deep Page <unread>"));
    assert!(out.contains("\nOpen sections\n  [S] Quick Notes\n"));
    assert!(!out.contains("hidden"));
}

#[test]
fn test_tree_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["--json", "tree", &fixture()]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let notebooks = json["notebooks"].as_array().unwrap();
    assert_eq!(notebooks.len(), 4);
    assert_eq!(notebooks[0]["kind"], "notebook");
    assert_eq!(notebooks[0]["path"], "It's A Notebook");
    assert_eq!(json["open_sections"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// pages / find
// ---------------------------------------------------------------------------

#[test]
fn test_pages_in_section() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["pages", &fixture(), "--section", "nb0-s0"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "It's A Notebook\\Section A\\Section A Page 2",
            "It's A Notebook\\Section A\\Section A Page 1",
            "It's A Notebook\\Section A\\Section A Page 0",
        ]
    );
}

#[test]
fn test_pages_all() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["pages", &fixture()]);
    assert_eq!(out.lines().count(), 31);
    // open sections have no notebook above them
    assert!(out.contains("\\Quick Notes\\Quick Notes Page 0\n"));
}

#[test]
fn test_pages_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["pages", &fixture(), "--section", "nb3-bin", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    let pages = json.as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["id"], "nb3-bin-s0-p1");
    assert_eq!(pages[0]["level"], 2);
    assert_eq!(pages[0]["in_recycle_bin"], true);
}

#[test]
fn test_find() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["find", &fixture(), "^Deep"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[S] Deep Research\\Projects\\Level 1\\Level 2\\Level 3\\Deep",
            "[P] Deep Page <unread> Research\\Projects\\Level 1\\Level 2\\Level 3\\Deep\\Deep Page",
        ]
    );
}

#[test]
fn test_find_bad_regex() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run(tmp.path(), &["find", &fixture(), "(unclosed"]);
    assert!(!success);
    assert!(stderr.starts_with("error:"));
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn test_export_item() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["export", &fixture(), "--id", "deep"]);
    assert!(out.starts_with("<?xml version=\"1.0\"?>\n<one:Section "));
    assert!(out.contains("ID=\"deep\""));
    assert!(out.contains("ID=\"deep-page\""));
    assert!(!out.contains("nb3"));
}

#[test]
fn test_export_reads_back() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ok(tmp.path(), &["export", &fixture()]);
    let exported = tmp.path().join("exported.xml");
    fs::write(&exported, out).unwrap();

    let stats = run_ok(tmp.path(), &["stats", exported.to_str().unwrap(), "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stats).unwrap();
    assert_eq!(json["pages"], 31);
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

const CONFIG: &str = r#"[store]
mode = "wrap"

[parser]
engine = "dom"

[paths]
separator = "/"
use_display_name = false
"#;

#[test]
fn test_explicit_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = tmp.path().join("custom.toml");
    fs::write(&config, CONFIG).unwrap();

    let out = run_ok(
        tmp.path(),
        &["-c", config.to_str().unwrap(), "pages", &fixture(), "--section", "nb0-s1"],
    );
    assert_eq!(
        out.lines().collect::<Vec<_>>(),
        vec![
            "Its A Notebook/Section B/Section B Page 1",
            "Its A Notebook/Section B/Section B Page 0",
        ]
    );
}

#[test]
fn test_config_in_working_directory() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("onetree.toml"), CONFIG).unwrap();

    let out = run_ok(tmp.path(), &["pages", &fixture(), "--section", "nb2-s0"]);
    assert_eq!(out.lines().next(), Some("Personal/Recipes/Recipes Page 1"));
}

#[test]
fn test_invalid_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("onetree.toml"), "[parser]\nengine = \"sax\"\n").unwrap();

    let (_, stderr, success) = run(tmp.path(), &["stats", &fixture()]);
    assert!(!success);
    assert!(stderr.contains("could not parse config"));
}

// ---------------------------------------------------------------------------
// errors
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_id() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (stdout, stderr, success) = run(tmp.path(), &["export", &fixture(), "--id", "nope"]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert_eq!(stderr.trim_end(), "error: no item with id 'nope'");
}

#[test]
fn test_missing_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let missing = tmp.path().join("missing.xml");
    let (_, stderr, success) = run(tmp.path(), &["stats", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("could not read"));
}

#[test]
fn test_malformed_snapshot() {
    let tmp = tempfile::TempDir::new().unwrap();
    let bad = tmp.path().join("bad.xml");
    fs::write(&bad, "<one:Notebooks xmlns:one=\"urn:x\"><one:Notebook ID=\"n\"").unwrap();
    let (_, stderr, success) = run(tmp.path(), &["stats", bad.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("malformed XML"));
}
