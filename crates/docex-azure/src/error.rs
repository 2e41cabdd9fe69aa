use docex_extract::ExtractError;
use thiserror::Error;

/// Failures talking to Azure services
#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Timed out waiting for {operation} after {polls} polls")]
    Timeout { operation: String, polls: u32 },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl AzureError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, polls: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            polls,
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AzureError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::serialization(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AzureError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<AzureError> for ExtractError {
    fn from(err: AzureError) -> Self {
        match err {
            AzureError::Provider { provider, message } => ExtractError::provider(provider, message),
            other => ExtractError::provider("azure", other.to_string()),
        }
    }
}
