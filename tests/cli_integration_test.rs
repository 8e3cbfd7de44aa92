mod common;

use std::path::Path;
use std::process::{Command, Output};

use common::{MALFORMED_DOCUMENT, gaia, gaia_with_extension, write_file, write_packet};
use tempfile::TempDir;
use voevent_author::{is_valid, load_path};

/// Run the binary from `dir` so no stray configuration file is picked up
fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_voevent-author"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("VOEVENT_THREADS")
        .env_remove("VOEVENT_FAIL_FAST")
        .env_remove("VOEVENT_SCHEMA")
        .env_remove("VOEVENT_FORMAT")
        .env_remove("VOEVENT_PRETTY")
        .env_remove("VOEVENT_VERBOSE")
        .env_remove("VOEVENT_QUIET")
        .env_remove("VOEVENT_EXTENSIONS")
        .output()
        .expect("Failed to execute CLI")
}

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("VOEvent"));
    assert!(stdout.contains("demo"));
    assert!(stdout.contains("check"));
}

#[test]
fn test_demo_writes_valid_packet() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["demo"]);

    assert_eq!(output.status.code(), Some(0), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wrote gaia.xml"));

    let written = temp_dir.path().join("gaia.xml");
    let voevent = load_path(&written).unwrap();
    assert!(is_valid(&voevent));
    assert_eq!(voevent.ivorn(), "ivo://hotwired.org/gaia_demo#1");
}

#[test]
fn test_demo_compact_output() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["-q", "demo", "--compact", "-o", "out/packet.xml"]);

    // The output directory does not exist yet
    assert_eq!(output.status.code(), Some(2));

    std::fs::create_dir(temp_dir.path().join("out")).unwrap();
    let output = run_cli(temp_dir.path(), &["-q", "demo", "--compact", "-o", "out/packet.xml"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());

    let xml = std::fs::read_to_string(temp_dir.path().join("out/packet.xml")).unwrap();
    assert!(!xml.contains("\n  <Who>"));
}

#[test]
fn test_check_reports_invalid_files() {
    let temp_dir = TempDir::new().unwrap();
    write_packet(temp_dir.path(), "alerts/good.xml", &gaia());
    write_packet(temp_dir.path(), "alerts/bad.xml", &gaia_with_extension());

    let output = run_cli(temp_dir.path(), &["check", "alerts"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("bad.xml"));
    assert!(stdout.contains("Mood"));
    assert!(stdout.contains("Total files: 2"));
    assert!(stdout.contains("Invalid: 1"));
}

#[test]
fn test_check_valid_directory_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    write_packet(temp_dir.path(), "alerts/one.xml", &gaia());
    write_packet(temp_dir.path(), "alerts/two.xml", &gaia());

    let output = run_cli(temp_dir.path(), &["check", "--threads", "2", "alerts"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Valid: 2"));
}

#[test]
fn test_check_json_output() {
    let temp_dir = TempDir::new().unwrap();
    write_packet(temp_dir.path(), "alerts/good.xml", &gaia());
    write_file(temp_dir.path(), "alerts/broken.xml", MALFORMED_DOCUMENT);

    let output = run_cli(temp_dir.path(), &["check", "--format", "json", "alerts"]);

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_files"], 2);
    assert_eq!(value["valid_files"], 1);
    assert_eq!(value["error_files"], 1);
}

#[test]
fn test_check_honours_config_file() {
    let temp_dir = TempDir::new().unwrap();
    write_packet(temp_dir.path(), "alerts/good.xml", &gaia());
    write_packet(temp_dir.path(), "alerts/good.voe", &gaia_with_extension());
    write_file(
        temp_dir.path(),
        "voevent-author.toml",
        "[files]\nextensions = [\"voe\"]\n",
    );

    let output = run_cli(temp_dir.path(), &["check", "alerts"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("good.voe"));

    // Flags given on the command line win over the file
    let output = run_cli(temp_dir.path(), &["check", "-e", "xml", "alerts"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_show_section() {
    let temp_dir = TempDir::new().unwrap();
    let packet = write_packet(temp_dir.path(), "gaia.xml", &gaia());

    let output = run_cli(
        temp_dir.path(),
        &["show", packet.to_str().unwrap(), "--section", "who"],
    );

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<Who>"));
    assert!(stdout.contains("Joe Bloggs"));
    assert!(!stdout.contains("<What>"));
}

#[test]
fn test_show_missing_section_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut voevent = gaia();
    voevent.take_citations();
    let packet = write_packet(temp_dir.path(), "gaia.xml", &voevent);

    let output = run_cli(
        temp_dir.path(),
        &["show", packet.to_str().unwrap(), "--section", "citations"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no Citations section"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["-v", "-q", "demo"]);

    assert!(!output.status.success());
    assert!(!temp_dir.path().join("gaia.xml").exists());
}

#[test]
fn test_nonexistent_path_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_cli(temp_dir.path(), &["check", "does-not-exist"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does-not-exist"));
}
