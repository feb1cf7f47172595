//! Logging utilities
//!
//! This module provides helpers for initializing the logging system.

/// Initialize the logging system
///
/// # Parameters
///
/// * `level` - Fallback log level used when `RUST_LOG` is not set
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env).try_init();
}
