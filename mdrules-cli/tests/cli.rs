//! End-to-end tests for the mdrules binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Binary with the user config directory pointed at an empty temp dir, so a
/// real ~/.config/mdrules never leaks into a test.
fn mdrules(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mdrules").expect("mdrules binary");
    cmd.env("MDRULES_CONFIG_DIR", config_home.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// Catalog and plan inspection
// ============================================================================

#[test]
fn test_list_rules_prints_catalog() {
    let home = tempfile::tempdir().unwrap();
    mdrules(&home)
        .arg("--list-rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("link_removal"))
        .stdout(predicate::str::contains("table_format"))
        .stdout(predicate::str::contains("spacing_fix"));
}

#[test]
fn test_plan_respects_dependencies() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(
        &home,
        "plan.yaml",
        "enableReferenceRemoval: true\nenableLinkRemoval: true\n",
    );
    mdrules(&home)
        .arg("--plan")
        .arg("-c")
        .arg(&config)
        .assert()
        .success()
        .stdout("link_removal\nreference_removal\nspacing_fix\n");
}

// ============================================================================
// Input and output
// ============================================================================

#[test]
fn test_stdin_to_stdout() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(&home, "bold.yaml", "enableBoldRemoval: true\n");
    mdrules(&home)
        .arg("-c")
        .arg(&config)
        .write_stdin("A **b** c\n")
        .assert()
        .success()
        .stdout("A b c\n")
        .stderr(predicate::str::contains("1 substitutions"));
}

#[test]
fn test_dash_reads_stdin() {
    let home = tempfile::tempdir().unwrap();
    mdrules(&home)
        .arg("-")
        .write_stdin("a  \n\n\n\nb")
        .assert()
        .success()
        .stdout("a\n\nb\n")
        .stderr(predicate::str::contains("Using default config"));
}

#[test]
fn test_in_place_rewrites_input() {
    let home = tempfile::tempdir().unwrap();
    let doc = write_config(&home, "doc.md", "|A|B|\n|-|-|\n|1|2|\n");
    let config = write_config(&home, "table.json", r#"{"enableTableFormat": true}"#);

    mdrules(&home)
        .arg(&doc)
        .arg("-c")
        .arg(&config)
        .arg("--in-place")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(
        fs::read_to_string(&doc).unwrap(),
        "| A | B |\n|---|---|\n| 1 | 2 |\n"
    );
}

#[test]
fn test_output_file() {
    let home = tempfile::tempdir().unwrap();
    let doc = write_config(&home, "doc.md", "## A\n### B\n");
    let out = home.path().join("out.md");
    let config = write_config(
        &home,
        "headings.yaml",
        "enableHeadingConversion: true\nheadingConversion:\n  mappings:\n    2: 1\n",
    );

    mdrules(&home)
        .arg(&doc)
        .arg("-c")
        .arg(&config)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).unwrap(), "# A\n## B\n");
    assert_eq!(fs::read_to_string(&doc).unwrap(), "## A\n### B\n");
}

#[test]
fn test_in_place_needs_input_file() {
    let home = tempfile::tempdir().unwrap();
    mdrules(&home)
        .arg("--in-place")
        .write_stdin("text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--in-place"));
}

#[test]
fn test_diff_shows_changes() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(&home, "bold.yaml", "enableBoldRemoval: true\n");
    mdrules(&home)
        .arg("-c")
        .arg(&config)
        .arg("--diff")
        .write_stdin("keep\nA **b** c\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("-A **b** c"))
        .stdout(predicate::str::contains("+A b c"));
}

// ============================================================================
// Configuration discovery
// ============================================================================

#[test]
fn test_discovered_config_is_used() {
    let home = tempfile::tempdir().unwrap();
    write_config(&home, "config.yaml", "enableBoldRemoval: true\n");
    mdrules(&home)
        .write_stdin("**x**")
        .assert()
        .success()
        .stdout("x\n")
        .stderr(predicate::str::contains("Loaded config from"));
}

#[test]
fn test_broken_discovered_config_reports_fallback() {
    let home = tempfile::tempdir().unwrap();
    write_config(&home, "config.yaml", "enableBoldRemoval: notabool\n");
    mdrules(&home)
        .write_stdin("**x**")
        .assert()
        .success()
        .stdout("**x**\n")
        .stderr(predicate::str::contains("using default config"))
        .stderr(predicate::str::contains("Loaded config from").not());
}

#[test]
fn test_missing_explicit_config_fails() {
    let home = tempfile::tempdir().unwrap();
    mdrules(&home)
        .arg("-c")
        .arg(home.path().join("absent.yaml"))
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.yaml"));
}

// ============================================================================
// Reporting and errors
// ============================================================================

#[test]
fn test_invalid_custom_rule_is_a_warning() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(
        &home,
        "custom.yaml",
        "customRegexRules:\n  - pattern: TODO\n    replacement: DONE\n  - pattern: \"[unclosed\"\n    replacement: x\n",
    );
    mdrules(&home)
        .arg("-c")
        .arg(&config)
        .write_stdin("TODO today")
        .assert()
        .success()
        .stdout("DONE today\n")
        .stderr(predicate::str::contains("[custom:1]"));
}

#[test]
fn test_unknown_rule_exits_nonzero() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(&home, "unknown.yaml", "rules:\n  - name: no_such_rule\n");
    mdrules(&home)
        .arg("-c")
        .arg(&config)
        .write_stdin("text")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown rule 'no_such_rule'"));
}

#[test]
fn test_json_report() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(&home, "bold.yaml", "enableBoldRemoval: true\n");
    mdrules(&home)
        .arg("-c")
        .arg(&config)
        .arg("--report")
        .arg("json")
        .write_stdin("**a** **b**")
        .assert()
        .success()
        .stderr(predicate::str::contains("\"substitutions\": 2"))
        .stderr(predicate::str::contains("\"changed\": true"));
}
