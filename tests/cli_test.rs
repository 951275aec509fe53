//! Tests for the `pycensus` binary: output files, messages, exit codes.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Run the binary with `cwd` as working directory.
fn pycensus(cwd: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pycensus"))
        .args(args)
        .current_dir(cwd.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("binary should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_calls_writes_calls_json() {
    let cwd = TempDir::new().unwrap();
    let shop = testdata_path().join("shop");

    let output = pycensus(&cwd, &["calls", shop.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Calls summary extracted to calls.json"));

    let json = fs::read_to_string(cwd.path().join("calls.json")).unwrap();
    assert!(json.starts_with(r#"[["str", 2], ["send", 2]"#));
}

#[test]
fn test_docstrings_writes_docstrings_json() {
    let cwd = TempDir::new().unwrap();
    let shop = testdata_path().join("shop");

    let output = pycensus(&cwd, &["docstrings", shop.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Docstrings extracted to docstrings.json"));

    let json = fs::read_to_string(cwd.path().join("docstrings.json")).unwrap();
    assert!(json.contains(r#""shop.cart.Cart.__init__": null"#));
}

#[test]
fn test_missing_argument_exits_with_usage() {
    let cwd = TempDir::new().unwrap();
    let output = pycensus(&cwd, &["calls"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert!(!cwd.path().join("calls.json").exists());
}

#[test]
fn test_parse_error_exits_without_output() {
    let cwd = TempDir::new().unwrap();
    let broken = testdata_path().join("broken");

    let output = pycensus(&cwd, &["docstrings", broken.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad.py"));
    assert!(!cwd.path().join("docstrings.json").exists());
}

#[test]
fn test_keep_going_reports_skipped_file() {
    let cwd = TempDir::new().unwrap();
    let broken = testdata_path().join("broken");

    let output = pycensus(&cwd, &["calls", broken.to_str().unwrap(), "--keep-going"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad.py"));

    let json = fs::read_to_string(cwd.path().join("calls.json")).unwrap();
    assert_eq!(json, r#"[["pong", 1]]"#);
}

#[test]
fn test_config_file_in_working_directory() {
    let cwd = TempDir::new().unwrap();
    fs::write(cwd.path().join("pycensus.yaml"), "on_parse_error: skip\n").unwrap();
    let broken = testdata_path().join("broken");

    let output = pycensus(&cwd, &["docstrings", broken.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    let json = fs::read_to_string(cwd.path().join("docstrings.json")).unwrap();
    assert_eq!(json, r#"{"broken.good": null, "broken.good.ping": "Reply."}"#);
}

#[test]
fn test_output_flag_and_top() {
    let cwd = TempDir::new().unwrap();
    let shop = testdata_path().join("shop");

    let output = pycensus(
        &cwd,
        &["calls", shop.to_str().unwrap(), "--output", "out/shop.json", "--top", "2"],
    );
    // The output directory does not exist.
    assert_eq!(output.status.code(), Some(2));

    fs::create_dir(cwd.path().join("out")).unwrap();
    let output = pycensus(
        &cwd,
        &["calls", shop.to_str().unwrap(), "--output", "out/shop.json", "--top", "2"],
    );
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("Most called"));
    assert!(text.contains("Calls summary extracted to out/shop.json"));
    assert!(cwd.path().join("out/shop.json").exists());
}
