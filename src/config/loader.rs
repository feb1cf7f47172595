//! Configuration loading functionality
//!
//! This module provides functionality for loading configuration from different
//! sources such as files and environment variables, and merging them with the
//! usual precedence: defaults < file < environment.

use std::env;
use std::fs;
use std::path::Path;

use crate::common::{AdminError, Result};
use crate::config::defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
use crate::config::{parse_api_base, AdminConfig};

/// Trait for loading configuration from different sources
pub trait ConfigLoader {
    /// Load configuration from a file
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self>
    where
        Self: Sized;

    /// Overlay environment variable values onto this configuration
    fn overlay_env(self) -> Result<Self>
    where
        Self: Sized;

    /// Auto-detect and load configuration from the best available sources
    fn auto_load(config_file: Option<&Path>) -> Result<Self>
    where
        Self: Sized;
}

impl ConfigLoader for AdminConfig {
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_display = path.display();

        let content = fs::read_to_string(path).map_err(|e| {
            AdminError::Config(format!("Failed to read config file {}: {}", path_display, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            AdminError::Config(format!(
                "Failed to parse JSON config file {}: {}",
                path_display, e
            ))
        })
    }

    fn overlay_env(mut self) -> Result<Self> {
        let get_env = |name: &str| -> Option<String> {
            env::var(format!("{}{}", ENV_PREFIX, name)).ok()
        };

        if let Some(value) = get_env("API_BASE") {
            self.api_base = parse_api_base(&value)?;
        }

        if let Some(value) = get_env("CSRF_COOKIE") {
            self.csrf_cookie = value;
        }

        if let Some(value) = get_env("LOG_LEVEL") {
            self.log_level = value;
        }

        if let Some(value) = get_env("CONNECTION_TIMEOUT") {
            self.connection_timeout = value.parse::<u64>().map_err(|e| {
                AdminError::Config(format!(
                    "Invalid {}CONNECTION_TIMEOUT value {}: {}",
                    ENV_PREFIX, value, e
                ))
            })?;
        }

        Ok(self)
    }

    fn auto_load(config_file: Option<&Path>) -> Result<Self> {
        use log::{debug, info, warn};

        let config = match config_file {
            Some(path) => {
                if path.exists() {
                    info!("Loading configuration from file: {}", path.display());
                    Self::from_file(path)?
                } else {
                    warn!("Configuration file not found: {}", path.display());
                    Self::default()
                }
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
                    Self::from_file(default_path)?
                } else {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            }
        };

        config.overlay_env()
    }
}
