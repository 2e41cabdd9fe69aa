//! HTTP server configuration

use docex_core::config::env::{get_env_or_default, parse_env_or_default};
use docex_core::{AppConfigTrait, ConfigError, ConfigSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub struct HttpDefaults;

impl HttpDefaults {
    /// Above the OCR poll budget plus several model calls per page
    pub const REQUEST_TIMEOUT_SECS: u64 = 900;
    pub const MAX_REQUEST_SIZE: usize = 50 * 1024 * 1024;
    pub const ENABLE_TRACING: bool = true;
    pub const HEALTH_CHECK_PATH: &'static str = "/health";
    pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
    pub const ENABLE_CORS: bool = true;
}

/// HTTP server specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    /// Enable request tracing
    pub enable_tracing: bool,
    /// Health check endpoint path
    pub health_check_path: String,
    /// Server shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
    /// Allow cross-origin requests from the dashboard
    pub enable_cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: HttpDefaults::REQUEST_TIMEOUT_SECS,
            max_request_size: HttpDefaults::MAX_REQUEST_SIZE,
            enable_tracing: HttpDefaults::ENABLE_TRACING,
            health_check_path: HttpDefaults::HEALTH_CHECK_PATH.to_string(),
            shutdown_timeout_secs: HttpDefaults::SHUTDOWN_TIMEOUT_SECS,
            enable_cors: HttpDefaults::ENABLE_CORS,
        }
    }
}

impl AppConfigTrait for HttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let request_timeout_secs = parse_env_or_default(
            "HTTP_REQUEST_TIMEOUT",
            HttpDefaults::REQUEST_TIMEOUT_SECS,
            "request_timeout_secs",
            "valid number of seconds",
        )?;

        let max_request_size = parse_env_or_default(
            "HTTP_MAX_REQUEST_SIZE",
            HttpDefaults::MAX_REQUEST_SIZE,
            "max_request_size",
            "valid number of bytes",
        )?;

        let enable_tracing = parse_env_or_default(
            "HTTP_ENABLE_TRACING",
            HttpDefaults::ENABLE_TRACING,
            "enable_tracing",
            "true or false",
        )?;

        let health_check_path =
            get_env_or_default("HTTP_HEALTH_CHECK_PATH", HttpDefaults::HEALTH_CHECK_PATH);

        let shutdown_timeout_secs = parse_env_or_default(
            "HTTP_SHUTDOWN_TIMEOUT",
            HttpDefaults::SHUTDOWN_TIMEOUT_SECS,
            "shutdown_timeout_secs",
            "valid number of seconds",
        )?;

        let enable_cors = parse_env_or_default(
            "HTTP_ENABLE_CORS",
            HttpDefaults::ENABLE_CORS,
            "enable_cors",
            "true or false",
        )?;

        Ok(HttpConfig {
            request_timeout_secs,
            max_request_size,
            enable_tracing,
            health_check_path,
            shutdown_timeout_secs,
            enable_cors,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation_failed(
                "Request timeout must be greater than 0",
            ));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::validation_failed(
                "Shutdown timeout must be greater than 0",
            ));
        }

        if self.max_request_size == 0 {
            return Err(ConfigError::validation_failed(
                "Maximum request size must be greater than 0",
            ));
        }

        if self.health_check_path.is_empty() || !self.health_check_path.starts_with('/') {
            return Err(ConfigError::validation_failed(
                "Health check path must be non-empty and start with '/'",
            ));
        }

        if matches!(self.health_check_path.as_str(), "/" | "/extract" | "/extract/") {
            return Err(ConfigError::validation_failed(format!(
                "Health check path '{}' collides with an API route",
                self.health_check_path
            )));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        for (field, var) in [
            ("request_timeout_secs", "HTTP_REQUEST_TIMEOUT"),
            ("max_request_size", "HTTP_MAX_REQUEST_SIZE"),
            ("enable_tracing", "HTTP_ENABLE_TRACING"),
            ("health_check_path", "HTTP_HEALTH_CHECK_PATH"),
            ("shutdown_timeout_secs", "HTTP_SHUTDOWN_TIMEOUT"),
            ("enable_cors", "HTTP_ENABLE_CORS"),
        ] {
            sources.insert(field.to_string(), ConfigSource::EnvVar(var.to_string()));
        }
        sources
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
