use super::env::{get_env_or_default, parse_env_or_default};
use super::{
    ConfigError, ConfigSource, DocumentIntelligenceConfig, OpenAiConfig, PipelineConfig,
};
use std::collections::HashMap;
use std::str::FromStr;

/// Configuration trait for application configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                field: "environment".to_string(),
                value: s.to_string(),
                expected: "development, testing, or production".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    /// Check if environment is production
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    pub server: ServerConfig,
    pub logging: LoggingSettings,
    pub document_intelligence: DocumentIntelligenceConfig,
    pub openai: OpenAiConfig,
    pub pipeline: PipelineConfig,
}

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Log level and output format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 8000;

    /// Socket address string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl AppConfigTrait for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let name = get_env_or_default("APP_NAME", "docex");
        let environment = Environment::from_str(&get_env_or_default("APP_ENV", "development"))?;

        Ok(AppConfig {
            name,
            environment,
            server: ServerConfig::from_env()?,
            logging: LoggingSettings::from_env()?,
            document_intelligence: DocumentIntelligenceConfig::from_env()?,
            openai: OpenAiConfig::from_env()?,
            pipeline: PipelineConfig::from_env()?,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::validation_failed("App name cannot be empty"));
        }

        self.server.validate()?;
        self.logging.validate()?;
        self.document_intelligence.validate()?;
        self.openai.validate()?;
        self.pipeline.validate()?;

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "name".to_string(),
            ConfigSource::EnvVar("APP_NAME".to_string()),
        );
        sources.insert(
            "environment".to_string(),
            ConfigSource::EnvVar("APP_ENV".to_string()),
        );
        for nested in [
            "server",
            "logging",
            "document_intelligence",
            "openai",
            "pipeline",
        ] {
            sources.insert(nested.to_string(), ConfigSource::Nested);
        }
        sources
    }
}

impl AppConfigTrait for ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let host = get_env_or_default("SERVER_HOST", "0.0.0.0");
        let port = parse_env_or_default(
            "SERVER_PORT",
            Self::DEFAULT_PORT,
            "port",
            "valid port number (1-65535)",
        )?;

        Ok(ServerConfig { host, port })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::validation_failed("Host cannot be empty"));
        }

        if self.port == 0 {
            return Err(ConfigError::validation_failed("Port cannot be 0"));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "host".to_string(),
            ConfigSource::EnvVar("SERVER_HOST".to_string()),
        );
        sources.insert(
            "port".to_string(),
            ConfigSource::EnvVar("SERVER_PORT".to_string()),
        );
        sources
    }
}

impl AppConfigTrait for LoggingSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingSettings {
            level: get_env_or_default("LOG_LEVEL", "info"),
            format: get_env_or_default("LOG_FORMAT", "compact"),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "level".to_string(),
                value: self.level.clone(),
                expected: "trace, debug, info, warn, or error".to_string(),
            });
        }

        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "format".to_string(),
                value: self.format.clone(),
                expected: "compact, pretty, or json".to_string(),
            });
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "level".to_string(),
            ConfigSource::EnvVar("LOG_LEVEL".to_string()),
        );
        sources.insert(
            "format".to_string(),
            ConfigSource::EnvVar("LOG_FORMAT".to_string()),
        );
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "APP_NAME",
        "APP_ENV",
        "SERVER_HOST",
        "SERVER_PORT",
        "LOG_LEVEL",
        "LOG_FORMAT",
        "DOCUMENT_INTELLIGENCE_ENDPOINT",
        "DOCUMENT_INTELLIGENCE_KEY",
        "DOCUMENT_INTELLIGENCE_MODEL",
        "GPT_4_1_AZURE_ENDPOINT",
        "GPT_4_1_API_KEY",
        "GPT_4_1_API_VERSION",
        "GPT_4_1_DEPLOYMENT_NAME",
        "TEMP_DIR",
        "RENDER_DPI",
        "MAPPING_KEY",
    ];

    fn set_test_env() {
        env::set_var("APP_NAME", "docex-test");
        env::set_var("APP_ENV", "testing");
        env::set_var("SERVER_HOST", "127.0.0.1");
        env::set_var("SERVER_PORT", "8080");
        env::set_var("LOG_LEVEL", "debug");
        env::set_var("LOG_FORMAT", "json");
        env::set_var(
            "DOCUMENT_INTELLIGENCE_ENDPOINT",
            "https://docintel.example.com/",
        );
        env::set_var("DOCUMENT_INTELLIGENCE_KEY", "di-key");
        env::set_var("GPT_4_1_AZURE_ENDPOINT", "https://openai.example.com");
        env::set_var("GPT_4_1_API_KEY", "oa-key");
        env::set_var("GPT_4_1_DEPLOYMENT_NAME", "gpt-4.1");
    }

    fn clean_test_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_app_config_from_env() {
        clean_test_env();
        set_test_env();

        let config = AppConfig::from_env().unwrap();

        assert_eq!(config.name, "docex-test");
        assert_eq!(config.environment, Environment::Testing);
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.logging.format, "json");
        assert_eq!(
            config.document_intelligence.endpoint,
            "https://docintel.example.com"
        );
        assert_eq!(config.openai.deployment, "gpt-4.1");
        assert!(config.validate().is_ok());

        clean_test_env();
    }

    #[test]
    #[serial]
    fn test_app_config_defaults() {
        clean_test_env();
        set_test_env();
        env::remove_var("APP_NAME");
        env::remove_var("APP_ENV");
        env::remove_var("SERVER_HOST");
        env::remove_var("SERVER_PORT");
        env::remove_var("LOG_LEVEL");
        env::remove_var("LOG_FORMAT");

        let config = AppConfig::from_env().unwrap();

        assert_eq!(config.name, "docex");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging, LoggingSettings::default());
        assert_eq!(config.pipeline.mapping_key, "dock_management");
        assert_eq!(config.pipeline.render_dpi, 300);

        clean_test_env();
    }

    #[test]
    #[serial]
    fn test_missing_deployment_name() {
        clean_test_env();
        set_test_env();
        env::remove_var("GPT_4_1_DEPLOYMENT_NAME");

        match AppConfig::from_env() {
            Err(ConfigError::MissingEnvVar { var }) => assert_eq!(var, "GPT_4_1_DEPLOYMENT_NAME"),
            other => panic!("Expected MissingEnvVar error, got {:?}", other),
        }

        clean_test_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port() {
        clean_test_env();
        set_test_env();
        env::set_var("SERVER_PORT", "invalid");

        match AppConfig::from_env() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "port"),
            other => panic!("Expected InvalidValue error for port, got {:?}", other),
        }

        clean_test_env();
    }

    #[test]
    fn test_invalid_log_level() {
        let settings = LoggingSettings {
            level: "loud".to_string(),
            format: "compact".to_string(),
        };

        match settings.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "level"),
            other => panic!("Expected InvalidValue error for level, got {:?}", other),
        }
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str("dev").unwrap(), Environment::Development);
        assert_eq!(Environment::from_str("TEST").unwrap(), Environment::Testing);
        assert_eq!(Environment::from_str("prod").unwrap(), Environment::Production);
        assert!(Environment::from_str("staging").is_err());
        assert_eq!(Environment::Production.to_string(), "production");
    }

    #[test]
    #[serial]
    fn test_config_sources() {
        clean_test_env();
        set_test_env();

        let config = AppConfig::from_env().unwrap();
        let sources = config.config_sources();

        assert!(matches!(sources.get("name"), Some(ConfigSource::EnvVar(_))));
        assert_eq!(sources.get("openai"), Some(&ConfigSource::Nested));

        clean_test_env();
    }
}
