//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the in-memory cache backend can hold
    pub max_entries: usize,
    /// Prefix prepended to every generated cache key
    pub key_prefix: String,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// JSON array file seeding the record table
    pub table_path: Option<PathBuf>,
    /// Build the table index before accepting requests
    pub warm_on_start: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 10000)
    /// - `KEY_PREFIX` - Global cache key prefix (default: empty)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `TABLE_PATH` - Record table JSON file (default: none, empty table)
    /// - `WARM_ON_START` - Warm the table index at startup (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            key_prefix: env::var("KEY_PREFIX").unwrap_or(defaults.key_prefix),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            table_path: env::var_os("TABLE_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            warm_on_start: parse_var("WARM_ON_START").unwrap_or(defaults.warm_on_start),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            key_prefix: String::new(),
            server_port: 3000,
            cleanup_interval: 1,
            table_path: None,
            warm_on_start: true,
        }
    }
}
