use thiserror::Error;

/// Errors raised while turning a document into extracted fields
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unknown field mapping: {name}")]
    UnknownMapping { name: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Invalid mapping catalog: {message}")]
    Catalog { message: String },

    #[error("Prompt template error: {message}")]
    Prompt { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub fn unknown_mapping(name: impl Into<String>) -> Self {
        Self::UnknownMapping { name: name.into() }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
        }
    }

    /// Whether the failure came from a remote service rather than local processing
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

impl From<image::ImageError> for ExtractError {
    fn from(err: image::ImageError) -> Self {
        Self::render(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ExtractError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::render(format!("rendering task failed: {}", err))
    }
}
