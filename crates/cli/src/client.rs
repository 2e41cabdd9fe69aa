use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Longer than the service's own request timeout
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(960);

/// Client for the extraction service
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(EXTRACT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Uploads `path` and returns the extraction content string.
    pub async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type_for(path))?;
        let form = Form::new().part("file", part);

        let url = format!("{}/extract/", self.base_url);
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            bail!("Error: {}", body);
        }

        let json: Value = serde_json::from_str(&body).context("Service returned invalid JSON")?;
        Ok(json
            .pointer("/formatted_response/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or("{}")
            .to_string())
    }

    /// Message served at the service root.
    pub async fn status(&self) -> Result<String> {
        let url = format!("{}/", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Service responded with {}", status);
        }
        let json: Value = response.json().await?;
        Ok(json["message"].as_str().unwrap_or_default().to_string())
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
