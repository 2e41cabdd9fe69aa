//! Credentials and tuning for the Azure services the extractor talks to.

use super::env::{get_env_optional, get_env_or_default, get_env_required, parse_env_or_default};
use super::validation::validate_endpoint;
use super::{AppConfigTrait, ConfigError, ConfigSource};
use std::collections::HashMap;
use std::fmt;

/// Analysis features requested from Document Intelligence on every call.
pub const DEFAULT_ANALYZE_FEATURES: &[&str] = &[
    "ocrHighResolution",
    "keyValuePairs",
    "barcodes",
    "formulas",
    "languages",
];

/// Azure Document Intelligence settings
#[derive(Clone)]
pub struct DocumentIntelligenceConfig {
    pub endpoint: String,
    pub key: String,
    pub model: String,
    pub api_version: String,
    pub features: Vec<String>,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
    /// Per call limit on the submit and each status poll
    pub request_timeout_secs: u64,
}

impl DocumentIntelligenceConfig {
    pub const DEFAULT_MODEL: &'static str = "prebuilt-layout";
    pub const API_VERSION: &'static str = "2024-11-30";

    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: trim_endpoint(endpoint.into()),
            key: key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            api_version: Self::API_VERSION.to_string(),
            features: DEFAULT_ANALYZE_FEATURES
                .iter()
                .map(|f| f.to_string())
                .collect(),
            poll_interval_ms: 1000,
            max_polls: 300,
            request_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for DocumentIntelligenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentIntelligenceConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("features", &self.features)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AppConfigTrait for DocumentIntelligenceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_env_required("DOCUMENT_INTELLIGENCE_ENDPOINT")?;
        let key = get_env_required("DOCUMENT_INTELLIGENCE_KEY")?;

        let mut config = Self::new(endpoint, key);
        if let Some(model) = get_env_optional("DOCUMENT_INTELLIGENCE_MODEL") {
            config.model = model;
        }
        config.poll_interval_ms = parse_env_or_default(
            "DOCUMENT_INTELLIGENCE_POLL_MS",
            config.poll_interval_ms,
            "poll_interval_ms",
            "positive integer (milliseconds)",
        )?;
        config.max_polls = parse_env_or_default(
            "DOCUMENT_INTELLIGENCE_MAX_POLLS",
            config.max_polls,
            "max_polls",
            "positive integer",
        )?;
        config.request_timeout_secs = parse_env_or_default(
            "DOCUMENT_INTELLIGENCE_TIMEOUT",
            config.request_timeout_secs,
            "request_timeout_secs",
            "positive integer (seconds)",
        )?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint("document_intelligence.endpoint", &self.endpoint)?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::validation_failed(
                "Document Intelligence model cannot be empty",
            ));
        }

        if self.max_polls == 0 {
            return Err(ConfigError::validation_failed(
                "Document Intelligence max_polls must be greater than 0",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation_failed(
                "Document Intelligence request timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "endpoint".to_string(),
            ConfigSource::EnvVar("DOCUMENT_INTELLIGENCE_ENDPOINT".to_string()),
        );
        sources.insert(
            "key".to_string(),
            ConfigSource::EnvVar("DOCUMENT_INTELLIGENCE_KEY".to_string()),
        );
        sources.insert(
            "model".to_string(),
            ConfigSource::EnvVar("DOCUMENT_INTELLIGENCE_MODEL".to_string()),
        );
        sources.insert(
            "api_version".to_string(),
            ConfigSource::Default(Self::API_VERSION.to_string()),
        );
        sources.insert(
            "request_timeout_secs".to_string(),
            ConfigSource::EnvVar("DOCUMENT_INTELLIGENCE_TIMEOUT".to_string()),
        );
        sources
    }
}

/// Azure OpenAI chat completion settings
#[derive(Clone)]
pub struct OpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
    pub request_timeout_secs: u64,
}

impl OpenAiConfig {
    pub const DEFAULT_API_VERSION: &'static str = "2024-12-01-preview";

    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: trim_endpoint(endpoint.into()),
            api_key: api_key.into(),
            api_version: Self::DEFAULT_API_VERSION.to_string(),
            deployment: deployment.into(),
            request_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AppConfigTrait for OpenAiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_env_required("GPT_4_1_AZURE_ENDPOINT")?;
        let api_key = get_env_required("GPT_4_1_API_KEY")?;
        let deployment = get_env_required("GPT_4_1_DEPLOYMENT_NAME")?;

        let mut config = Self::new(endpoint, api_key, deployment);
        config.api_version =
            get_env_or_default("GPT_4_1_API_VERSION", Self::DEFAULT_API_VERSION);
        config.request_timeout_secs = parse_env_or_default(
            "OPENAI_TIMEOUT",
            config.request_timeout_secs,
            "request_timeout_secs",
            "positive integer (seconds)",
        )?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint("openai.endpoint", &self.endpoint)?;

        if self.deployment.trim().is_empty() {
            return Err(ConfigError::validation_failed(
                "Deployment name must be configured",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation_failed(
                "OpenAI request timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "endpoint".to_string(),
            ConfigSource::EnvVar("GPT_4_1_AZURE_ENDPOINT".to_string()),
        );
        sources.insert(
            "api_key".to_string(),
            ConfigSource::EnvVar("GPT_4_1_API_KEY".to_string()),
        );
        sources.insert(
            "api_version".to_string(),
            ConfigSource::EnvVar("GPT_4_1_API_VERSION".to_string()),
        );
        sources.insert(
            "deployment".to_string(),
            ConfigSource::EnvVar("GPT_4_1_DEPLOYMENT_NAME".to_string()),
        );
        sources.insert(
            "request_timeout_secs".to_string(),
            ConfigSource::EnvVar("OPENAI_TIMEOUT".to_string()),
        );
        sources
    }
}

fn trim_endpoint(endpoint: String) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}
