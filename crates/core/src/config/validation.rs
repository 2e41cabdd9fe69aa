use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Parsing error: {message}")]
    ParsingError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create a missing environment variable error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar { var: var.into() }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// Create a parsing error
    pub fn parsing(message: impl Into<String>) -> Self {
        Self::ParsingError {
            message: message.into(),
        }
    }
}

/// Checks that an endpoint looks like an absolute http(s) URL.
pub fn validate_endpoint(field: &str, endpoint: &str) -> Result<(), ConfigError> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            field,
            endpoint,
            "absolute URL starting with http:// or https://",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::missing_env("GPT_4_1_DEPLOYMENT_NAME");
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: GPT_4_1_DEPLOYMENT_NAME"
        );

        let err = ConfigError::invalid_value("port", "abc", "valid port number");
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("endpoint", "https://example.cognitiveservices.azure.com").is_ok());
        assert!(validate_endpoint("endpoint", "http://localhost:9000").is_ok());

        let err = validate_endpoint("endpoint", "example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "endpoint"));
    }
}
