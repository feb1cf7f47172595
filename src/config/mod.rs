//! Configuration module
//!
//! This module handles application configuration, including loading from
//! different sources (files, environment variables, command line arguments)
//! and validating the configuration.

mod defaults;
mod loader;

pub use self::loader::ConfigLoader;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::common::{AdminError, Result};

/// Custom deserializer for the API base URL
fn deserialize_api_base<'de, D>(deserializer: D) -> std::result::Result<Url, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_api_base(&s).map_err(serde::de::Error::custom)
}

/// Admin console configuration
///
/// Contains all configuration options the admin client needs. Supports
/// loading from configuration files, environment variables, and command
/// line arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct AdminConfig {
    // --- Network settings ---

    /// Base URL of the service API all admin calls are scoped to.
    /// Requests outside this origin and path prefix bypass the CSRF layer.
    #[serde(default = "defaults::api_base", deserialize_with = "deserialize_api_base")]
    pub api_base: Url,

    /// Connection timeout in seconds for API requests
    #[serde(default = "defaults::connection_timeout")]
    pub connection_timeout: u64,

    // --- Security settings ---

    /// Name of the cookie carrying the anti-CSRF token
    #[serde(default = "defaults::csrf_cookie")]
    pub csrf_cookie: String,

    // --- General settings ---

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

impl Default for AdminConfig {
    /// Create a default configuration using centralized defaults
    #[inline]
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            connection_timeout: defaults::connection_timeout(),
            csrf_cookie: defaults::csrf_cookie(),
            log_level: defaults::log_level(),
        }
    }
}

impl AdminConfig {
    /// Validate the configuration
    ///
    /// Checks that the API base is an absolute HTTP(S) URL, the CSRF cookie
    /// name is a plausible cookie token, and the timeout is non-zero.
    pub fn validate(&self) -> Result<()> {
        match self.api_base.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AdminError::Config(format!(
                    "API base must use http or https, got scheme: {}",
                    other
                )))
            }
        }

        if self.api_base.host_str().is_none() {
            return Err(AdminError::Config(format!(
                "API base has no host: {}",
                self.api_base
            )));
        }

        if self.csrf_cookie.is_empty()
            || !self
                .csrf_cookie
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(AdminError::Config(format!(
                "Invalid CSRF cookie name: {:?}",
                self.csrf_cookie
            )));
        }

        if self.connection_timeout == 0 {
            return Err(AdminError::Config(
                "Connection timeout must be greater than zero".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(AdminError::Config(format!(
                "Invalid log level: {}. Valid values are: error, warn, info, debug, trace",
                other
            ))),
        }
    }
}

/// Parse and validate an API base URL string
///
/// Accepts absolute `http`/`https` URLs only; a trailing slash is preserved
/// so path-prefix scoping stays predictable.
pub fn parse_api_base(value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| AdminError::Config(format!("Invalid API base URL {}: {}", value, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AdminError::Config(format!(
                "API base must use http or https, got scheme: {}",
                other
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(AdminError::Config(format!("API base has no host: {}", value)));
    }

    Ok(url)
}

/// Log the configuration
pub fn log_config(config: &AdminConfig) {
    use log::info;

    if !log::log_enabled!(log::Level::Info) {
        return;
    }

    info!("=== Final Configuration ===");
    info!("Network Settings:");
    info!("  API base: {}", config.api_base);
    info!("  Connection timeout: {} seconds", config.connection_timeout);
    info!("Security Settings:");
    info!("  CSRF cookie name: {}", config.csrf_cookie);
    info!("General Settings:");
    info!("  Log level: {}", config.log_level);
    info!("=========================");
}

// Global configuration storage
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::RwLock;

static CONFIG: Lazy<RwLock<AdminConfig>> = Lazy::new(|| RwLock::new(AdminConfig::default()));

/// Initialize the global configuration from the best available sources
pub fn initialize(config_file: Option<&Path>) -> Result<()> {
    let config = AdminConfig::auto_load(config_file)?;
    config.validate()?;

    let mut global_config = CONFIG.write().unwrap();
    *global_config = config;

    Ok(())
}

/// Get a copy of the current global configuration
pub fn get_config() -> AdminConfig {
    let config = CONFIG.read().unwrap();
    config.clone()
}

/// Replace the global configuration after validating it
pub fn update_config(config: AdminConfig) -> Result<()> {
    config.validate()?;

    let mut global_config = CONFIG.write().unwrap();
    *global_config = config;

    Ok(())
}

// Export constants needed externally
pub use defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
