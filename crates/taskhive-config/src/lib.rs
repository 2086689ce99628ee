// crates/taskhive-config/src/lib.rs
// ============================================================================
// Module: Taskhive Config
// Description: Canonical configuration model for the Taskhive server.
// Purpose: Load, parse, and validate TOML configuration fail-closed before
//          any listener or store is opened.
// Dependencies: serde, thiserror, toml, taskhive-core, taskhive-store-sqlite
// ============================================================================

//! ## Overview
//!
//! Configuration for the Taskhive server is a single TOML file with three
//! sections: `[server]` for the HTTP listener, `[store]` for the `SQLite`
//! backend, and `[tenants]` for the quota defaults applied to newly
//! registered tenants.
//!
//! Loading is strict: oversized files, non-UTF-8 content, and unknown keys
//! are rejected before validation, and validation rejects any value the
//! server could not operate with.

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use taskhive_core::TenantDefaults;
use taskhive_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted configuration file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1_048_576;

/// Maximum accepted configuration path length in bytes.
const MAX_PATH_LEN: usize = 4_096;

/// Maximum accepted length of a single path component in bytes.
const MAX_PATH_COMPONENT_LEN: usize = 255;

/// Lower bound for session lifetime (one minute).
const MIN_SESSION_TTL_SECS: u64 = 60;

/// Upper bound for session lifetime (thirty days).
const MAX_SESSION_TTL_SECS: u64 = 2_592_000;

/// Default configuration path when none is supplied.
const DEFAULT_CONFIG_PATH: &str = "taskhive.toml";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors surfaced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem read failed.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing failed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

/// Default listener address (loopback only).
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Default session lifetime (one day).
const fn default_session_ttl_secs() -> u64 {
    86_400
}

/// Quota defaults applied to newly registered tenants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TenantQuotaConfig {
    /// User quota stamped on new tenants.
    #[serde(default = "default_max_users")]
    pub max_users: u32,
    /// Project quota stamped on new tenants.
    #[serde(default = "default_max_projects")]
    pub max_projects: u32,
}

impl Default for TenantQuotaConfig {
    fn default() -> Self {
        Self {
            max_users: default_max_users(),
            max_projects: default_max_projects(),
        }
    }
}

impl TenantQuotaConfig {
    /// Converts the quota section into engine defaults.
    #[must_use]
    pub const fn to_defaults(&self) -> TenantDefaults {
        TenantDefaults {
            max_users: self.max_users,
            max_projects: self.max_projects,
        }
    }
}

/// Default user quota for new tenants.
const fn default_max_users() -> u32 {
    25
}

/// Default project quota for new tenants.
const fn default_max_projects() -> u32 {
    15
}

/// Root configuration document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// `SQLite` store settings.
    pub store: SqliteStoreConfig,
    /// Tenant quota defaults.
    #[serde(default)]
    pub tenants: TenantQuotaConfig,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl TrackerConfig {
    /// Loads configuration from `path`, or from `taskhive.toml` when absent.
    ///
    /// # Errors
    /// Returns `ConfigError` when the path is unsafe, the file cannot be
    /// read, the content is not UTF-8 TOML, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        check_path(path)?;
        let metadata = std::fs::metadata(path)
            .map_err(|err| ConfigError::Io(format!("config file inaccessible: {err}")))?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Invalid(
                "config file exceeds size limit".to_string(),
            ));
        }
        let bytes = std::fs::read(path)
            .map_err(|err| ConfigError::Io(format!("config file unreadable: {err}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string without validating it.
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` when the document is not valid TOML or
    /// contains unknown keys.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates every section of the configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid("server.bind must be a socket address".to_string()))?;
        if self.server.session_ttl_secs < MIN_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid(
                "server.session_ttl_secs below minimum".to_string(),
            ));
        }
        if self.server.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid(
                "server.session_ttl_secs above maximum".to_string(),
            ));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "store.path must be non-empty".to_string(),
            ));
        }
        if self.tenants.max_users == 0 {
            return Err(ConfigError::Invalid(
                "tenants.max_users must be at least 1".to_string(),
            ));
        }
        if self.tenants.max_projects == 0 {
            return Err(ConfigError::Invalid(
                "tenants.max_projects must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rejects paths outside the accepted length bounds.
fn check_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_PATH_LEN {
        return Err(ConfigError::Invalid(
            "config path exceeds max length".to_string(),
        ));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LEN {
            return Err(ConfigError::Invalid(
                "config path component too long".to_string(),
            ));
        }
    }
    Ok(())
}
