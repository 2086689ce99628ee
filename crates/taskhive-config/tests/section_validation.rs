//! Section validation tests for taskhive-config.
// crates/taskhive-config/tests/section_validation.rs
// ============================================================================
// Module: Config Section Validation Tests
// Description: Validate server, store, and tenant quota constraints.
// Purpose: Ensure every section fails closed on unusable values.
// ============================================================================

use taskhive_config::ConfigError;

mod common;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn bind_must_be_a_socket_address() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "not-an-address".to_string();
    assert_invalid(config.validate(), "server.bind must be a socket address")?;
    Ok(())
}

#[test]
fn session_ttl_has_a_floor() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.session_ttl_secs = 5;
    assert_invalid(config.validate(), "session_ttl_secs below minimum")?;
    Ok(())
}

#[test]
fn session_ttl_has_a_ceiling() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.session_ttl_secs = 60 * 60 * 24 * 365;
    assert_invalid(config.validate(), "session_ttl_secs above maximum")?;
    Ok(())
}

#[test]
fn store_path_must_be_non_empty() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.store.path = std::path::PathBuf::new();
    assert_invalid(config.validate(), "store.path must be non-empty")?;
    Ok(())
}

#[test]
fn tenant_quotas_must_be_at_least_one() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.tenants.max_users = 0;
    assert_invalid(config.validate(), "tenants.max_users must be at least 1")?;

    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.tenants.max_projects = 0;
    assert_invalid(config.validate(), "tenants.max_projects must be at least 1")?;
    Ok(())
}

#[test]
fn minimal_document_validates() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn quota_section_converts_to_engine_defaults() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    let defaults = config.tenants.to_defaults();
    if defaults.max_users != 25 || defaults.max_projects != 15 {
        return Err("quota conversion changed the values".to_string());
    }
    Ok(())
}
