//! Centralized configuration defaults
//!
//! All default values live here so the serde defaults, `Default` impl, and
//! documentation cannot drift apart.

use url::Url;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "SANCTUM_";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "sanctum-admin.json";

/// Default API base URL string
pub const API_BASE_STR: &str = "http://127.0.0.1:8080/api";

/// Default CSRF cookie name
pub const CSRF_COOKIE_STR: &str = "sanctum_csrf";

/// Default log level
pub const LOG_LEVEL_STR: &str = "info";

/// Default API base URL
pub fn api_base() -> Url {
    // The literal above is a valid absolute URL; parsing it cannot fail.
    Url::parse(API_BASE_STR).unwrap()
}

/// Default CSRF cookie name
pub fn csrf_cookie() -> String {
    CSRF_COOKIE_STR.to_string()
}

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

/// Default connection timeout in seconds
pub fn connection_timeout() -> u64 {
    30
}
