//! Azure Document Intelligence analyze client.

use crate::error::AzureError;
use async_trait::async_trait;
use docex_core::DocumentIntelligenceConfig;
use docex_extract::{AnalyzeResult, DocumentAnalyzer, ExtractError};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

const PROVIDER: &str = "document-intelligence";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION: &str = "operation-location";
const USER_AGENT: &str = "docex/0.3";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: ServiceError,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ServiceError {
    fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

/// Runs the layout model over uploaded documents
#[derive(Clone)]
pub struct DocumentIntelligenceClient {
    config: DocumentIntelligenceConfig,
    client: Client,
}

impl DocumentIntelligenceClient {
    pub fn new(config: DocumentIntelligenceConfig) -> Result<Self, AzureError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AzureError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// URL the analyze request is posted to
    pub fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}&features={}&stringIndexType=unicodeCodePoint&outputContentFormat=text",
            self.config.endpoint,
            self.config.model,
            self.config.api_version,
            self.config.features.join(",")
        )
    }

    fn build_headers(&self) -> Result<HeaderMap, AzureError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            KEY_HEADER,
            HeaderValue::from_str(&self.config.key)
                .map_err(|e| AzureError::configuration(format!("Invalid API key format: {}", e)))?,
        );
        Ok(headers)
    }

    /// Submits the document and waits for the analysis to finish.
    pub async fn analyze_document(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<AnalyzeResult, AzureError> {
        let headers = self.build_headers()?;
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|e| AzureError::configuration(format!("Invalid content type: {}", e)))?;

        debug!(bytes = bytes.len(), model = %self.config.model, "Submitting document for analysis");
        let response = self
            .client
            .post(self.analyze_url())
            .headers(headers)
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            error!("Document analysis request failed: {}", message);
            return Err(AzureError::provider(PROVIDER, message));
        }

        let operation_url = response
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                AzureError::provider(PROVIDER, "analyze response has no Operation-Location header")
            })?;

        self.poll(&operation_url).await
    }

    async fn poll(&self, operation_url: &str) -> Result<AnalyzeResult, AzureError> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        for attempt in 1..=self.config.max_polls {
            let response = self
                .client
                .get(operation_url)
                .headers(self.build_headers()?)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                let message = error_message(status, &body);
                error!("Polling document analysis failed: {}", message);
                return Err(AzureError::provider(PROVIDER, message));
            }

            let operation: AnalyzeOperation = serde_json::from_str(&body)?;
            match operation.status.as_str() {
                "succeeded" => {
                    let result = operation.analyze_result.ok_or_else(|| {
                        AzureError::provider(PROVIDER, "analysis succeeded without a result")
                    })?;
                    info!(pages = result.pages.len(), polls = attempt, "Document analysis finished");
                    return Ok(result);
                }
                "failed" | "canceled" => {
                    let message = operation
                        .error
                        .map(|e| e.describe())
                        .unwrap_or_else(|| format!("analysis {}", operation.status));
                    error!("Document analysis {}: {}", operation.status, message);
                    return Err(AzureError::provider(PROVIDER, message));
                }
                other => {
                    debug!(status = other, attempt, "Document analysis in progress");
                    tokio::time::sleep(interval).await;
                }
            }
        }

        Err(AzureError::timeout("document analysis", self.config.max_polls))
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) => format!("HTTP {}: {}", status, parsed.error.describe()),
        Err(_) => format!("HTTP {}: {}", status, body),
    }
}

#[async_trait]
impl DocumentAnalyzer for DocumentIntelligenceClient {
    async fn analyze(&self, bytes: &[u8], content_type: &str) -> Result<AnalyzeResult, ExtractError> {
        Ok(self.analyze_document(bytes, content_type).await?)
    }
}
