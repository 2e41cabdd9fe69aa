//! Shared configuration and error types for the docex service.

pub mod config;
pub mod errors;

pub use config::validation::ConfigError;
pub use config::{
    AppConfig, AppConfigTrait, ConfigSource, DocumentIntelligenceConfig, Environment,
    LoggingSettings, OpenAiConfig, PipelineConfig, ServerConfig,
};
pub use errors::{ApiError, ApiErrorResponse};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported in logs and health checks
pub const SERVICE_NAME: &str = "docex";

pub fn version() -> &'static str {
    VERSION
}
