//! HTTP server error types

use docex_extract::ExtractError;
use thiserror::Error;

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

/// HTTP server errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Server startup failed: {message}")]
    StartupFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Request too large: {message}")]
    RequestTooLarge { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Upstream service failed: {provider} - {message}")]
    UpstreamFailed { provider: String, message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl HttpError {
    pub fn startup<T: Into<String>>(message: T) -> Self {
        HttpError::StartupFailed {
            message: message.into(),
        }
    }

    pub fn config<T: Into<String>>(message: T) -> Self {
        HttpError::ConfigError {
            message: message.into(),
        }
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HttpError::BadRequest {
            message: message.into(),
        }
    }

    pub fn validation_error<T: Into<String>>(message: T) -> Self {
        HttpError::ValidationError {
            message: message.into(),
        }
    }

    pub fn payload_too_large<T: Into<String>>(message: T) -> Self {
        HttpError::RequestTooLarge {
            message: message.into(),
        }
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        HttpError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn extraction<T: Into<String>>(message: T) -> Self {
        HttpError::ExtractionFailed {
            message: message.into(),
        }
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        HttpError::InternalError {
            message: message.into(),
        }
    }

    /// Get error code for consistent API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            HttpError::StartupFailed { .. } => "SERVER_STARTUP_FAILED",
            HttpError::ConfigError { .. } => "CONFIGURATION_ERROR",
            HttpError::BadRequest { .. } => "BAD_REQUEST",
            HttpError::ValidationError { .. } => "VALIDATION_ERROR",
            HttpError::RequestTooLarge { .. } => "REQUEST_TOO_LARGE",
            HttpError::NotFound { .. } => "RESOURCE_NOT_FOUND",
            HttpError::ExtractionFailed { .. } => "EXTRACTION_FAILED",
            HttpError::UpstreamFailed { .. } => "UPSTREAM_ERROR",
            HttpError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<docex_core::ConfigError> for HttpError {
    fn from(err: docex_core::ConfigError) -> Self {
        HttpError::config(err.to_string())
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::internal(format!("IO error: {}", err))
    }
}

impl From<ExtractError> for HttpError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Provider { provider, message } => {
                HttpError::UpstreamFailed { provider, message }
            }
            other => HttpError::extraction(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(HttpError::bad_request("test").error_code(), "BAD_REQUEST");
        assert_eq!(HttpError::internal("test").error_code(), "INTERNAL_ERROR");
        assert_eq!(
            HttpError::validation_error("Field is required").error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let config_error = docex_core::ConfigError::validation_failed("Test validation error");
        let http_error = HttpError::from(config_error);
        assert!(matches!(http_error, HttpError::ConfigError { .. }));
    }

    #[test]
    fn test_extract_error_conversion() {
        let upstream = HttpError::from(ExtractError::provider("azure-openai", "HTTP 429"));
        assert_eq!(upstream.error_code(), "UPSTREAM_ERROR");
        assert_eq!(
            upstream.to_string(),
            "Upstream service failed: azure-openai - HTTP 429"
        );

        let render = HttpError::from(ExtractError::render("Failed to open PDF"));
        assert_eq!(render.error_code(), "EXTRACTION_FAILED");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let http_error = HttpError::from(io_error);
        assert!(matches!(http_error, HttpError::InternalError { .. }));
    }
}
