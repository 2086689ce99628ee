// crates/taskhive-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Helpers
// Description: Shared fixtures for configuration tests.
// Purpose: Provide a minimal valid configuration document.
// ============================================================================

use taskhive_config::ConfigError;
use taskhive_config::TrackerConfig;

/// Returns the smallest configuration document that passes validation.
pub fn minimal_config() -> Result<TrackerConfig, ConfigError> {
    TrackerConfig::from_toml(
        r#"
        [store]
        path = "taskhive.db"
        "#,
    )
}
