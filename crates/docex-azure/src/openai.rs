//! Azure OpenAI chat completions client.

use crate::error::AzureError;
use async_trait::async_trait;
use docex_core::OpenAiConfig;
use docex_extract::{ChatModel, ChatRequest, ExtractError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

const PROVIDER: &str = "azure-openai";
const KEY_HEADER: &str = "api-key";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Chat model backed by an Azure OpenAI deployment
#[derive(Clone)]
pub struct AzureOpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl AzureOpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, AzureError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AzureError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint, self.config.deployment, self.config.api_version
        )
    }

    /// Content of the first choice, `None` when the model returned none.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<Option<String>, AzureError> {
        debug!(
            deployment = %self.config.deployment,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "Requesting chat completion"
        );

        let response = self
            .client
            .post(self.completions_url())
            .header(KEY_HEADER, &self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) => format!("HTTP {}: {}", status, body),
            };
            error!("Chat completion failed: {}", message);
            return Err(AzureError::provider(PROVIDER, message));
        }

        let completion: CompletionResponse = serde_json::from_str(&body)?;
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl ChatModel for AzureOpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<Option<String>, ExtractError> {
        Ok(self.chat_completion(&request).await?)
    }
}
