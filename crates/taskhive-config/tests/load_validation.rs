//! Config load validation tests for taskhive-config.
// crates/taskhive-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// ============================================================================

use std::io::Write;
use std::path::Path;

use taskhive_config::ConfigError;
use taskhive_config::TrackerConfig;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<TrackerConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(
        TrackerConfig::load(Some(path)),
        "config path exceeds max length",
    )?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(
        TrackerConfig::load(Some(path)),
        "config path component too long",
    )?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(
        TrackerConfig::load(Some(file.path())),
        "config file exceeds size limit",
    )?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF])
        .map_err(|err| err.to_string())?;
    assert_invalid(
        TrackerConfig::load(Some(file.path())),
        "config file must be utf-8",
    )?;
    Ok(())
}

#[test]
fn load_rejects_unknown_keys() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"[store]\npath = \"taskhive.db\"\nsurprise = true\n")
        .map_err(|err| err.to_string())?;
    assert_invalid(TrackerConfig::load(Some(file.path())), "parse error")?;
    Ok(())
}

#[test]
fn load_accepts_minimal_document_and_applies_defaults() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"[store]\npath = \"taskhive.db\"\n")
        .map_err(|err| err.to_string())?;
    let config = TrackerConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:8080" {
        return Err(format!("unexpected default bind: {}", config.server.bind));
    }
    if config.tenants.max_users != 25 || config.tenants.max_projects != 15 {
        return Err("unexpected default tenant quotas".to_string());
    }
    Ok(())
}
