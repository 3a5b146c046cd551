// tests/error_handling.rs

mod common;
use crate::common::builders::ConfigFileBuilder;

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use pulserun::config::{default_config_path, load_and_validate, ConfigFile};
use pulserun::errors::PulserunError;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(result: Result<ConfigFile, PulserunError>, needle: &str) {
    match result {
        Err(PulserunError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}")
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_minimal_config_uses_defaults() {
    let file = config_file(
        r#"
[pipeline]
executable = "/opt/crowd-pulse/bin/crowd-pulse"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let root = file.path().parent().unwrap();

    assert_eq!(
        cfg.pipeline.executable,
        Path::new("/opt/crowd-pulse/bin/crowd-pulse")
    );
    assert!(cfg.pipeline.database.is_none());
    assert_eq!(cfg.logs.path, root.join("logs"));
    assert_eq!(cfg.store.path, root.join("data"));
    assert_eq!(cfg.tail.initial_lines, 100);
    assert_eq!(cfg.tail.batch_max_lines, 20);
    assert_eq!(cfg.tail.batch_window(), Duration::from_millis(1000));
}

#[test]
fn test_absolute_paths_are_kept() {
    let file = config_file(
        r#"
[pipeline]
executable = "crowd-pulse"
database = "mongodb://localhost/crowd-pulse"

[logs]
path = "/var/log/crowd-pulse"

[store]
path = "/var/lib/pulserun"

[tail]
initial_lines = 10
batch_max_lines = 5
batch_window_ms = 250
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.pipeline.database.as_deref(), Some("mongodb://localhost/crowd-pulse"));
    assert_eq!(cfg.logs.path, Path::new("/var/log/crowd-pulse"));
    assert_eq!(cfg.store.path, Path::new("/var/lib/pulserun"));
    assert_eq!(cfg.tail.initial_lines, 10);
    assert_eq!(cfg.tail.batch_max_lines, 5);
    assert_eq!(cfg.tail.batch_window(), Duration::from_millis(250));
}

#[test]
fn test_missing_pipeline_section_is_toml_error() {
    let file = config_file(
        r#"
[logs]
path = "logs"
"#,
    );

    match load_and_validate(file.path()) {
        Err(PulserunError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    match load_and_validate("/definitely/not/here/Pulserun.toml") {
        Err(PulserunError::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        Err(e) => panic!("Expected IoError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_executable_returns_config_error() {
    let file = config_file(
        r#"
[pipeline]
executable = ""
"#,
    );
    expect_config_error(load_and_validate(file.path()), "[pipeline].executable");
}

#[test]
fn test_blank_database_returns_config_error() {
    let file = config_file(
        r#"
[pipeline]
executable = "crowd-pulse"
database = "   "
"#,
    );
    expect_config_error(load_and_validate(file.path()), "[pipeline].database");
}

#[test]
fn test_zero_batch_size_returns_config_error() {
    let raw = ConfigFileBuilder::new("crowd-pulse").tail(100, 0, 1000).raw();
    expect_config_error(ConfigFile::try_from(raw), "[tail].batch_max_lines must be >= 1");
}

#[test]
fn test_zero_batch_window_returns_config_error() {
    let raw = ConfigFileBuilder::new("crowd-pulse").tail(100, 20, 0).raw();
    expect_config_error(ConfigFile::try_from(raw), "[tail].batch_window_ms");
}

#[test]
fn test_empty_store_path_returns_config_error() {
    let raw = ConfigFileBuilder::new("crowd-pulse").store(Path::new("")).raw();
    expect_config_error(ConfigFile::try_from(raw), "[store].path");
}

#[test]
fn test_default_config_path() {
    assert_eq!(default_config_path(), Path::new("Pulserun.toml"));
}
