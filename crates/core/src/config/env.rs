//! Helpers for reading configuration from environment variables

use super::ConfigError;
use std::env;
use std::str::FromStr;

/// Read a required variable; empty values count as missing.
pub fn get_env_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::missing_env(key)),
    }
}

pub fn get_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub fn get_env_or_default(key: &str, default: &str) -> String {
    get_env_optional(key).unwrap_or_else(|| default.to_string())
}

/// Read and parse a variable, falling back to `default` when unset.
pub fn parse_env_or_default<T: FromStr>(
    key: &str,
    default: T,
    field: &str,
    expected: &str,
) -> Result<T, ConfigError> {
    match get_env_optional(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::invalid_value(field, raw, expected)),
        None => Ok(default),
    }
}
