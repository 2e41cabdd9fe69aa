//! Document upload and extraction.

use crate::errors::{HttpError, HttpResult};
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use docex_extract::{document_id, page_content, DocumentLayout, ExtractionDocument, OCTET_STREAM};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const UPLOAD_FIELD: &str = "file";
const FALLBACK_FILE_NAME: &str = "upload";
const TEMP_PREFIX: &str = "temp";

/// Response body in the chat completion shape the dashboard consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub formatted_response: FormattedResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Extraction output as JSON text
    pub content: String,
}

impl ExtractResponse {
    pub fn new(content: String) -> Self {
        Self {
            formatted_response: FormattedResponse {
                choices: vec![Choice {
                    message: ResponseMessage { content },
                }],
            },
        }
    }
}

struct Upload {
    file_name: String,
    bytes: Bytes,
}

pub async fn extract_information(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HttpResult<Json<ExtractResponse>> {
    let mut multipart = multipart.map_err(|e| HttpError::validation_error(e.body_text()))?;
    let upload = read_upload(&mut multipart).await?;
    info!(file = %upload.file_name, bytes = upload.bytes.len(), "Received document");

    // Dropping the guard removes the file, also when the request is cancelled
    let _temp_file = persist_upload(&state.pipeline_config.temp_dir, &upload).await?;
    let content = process_document(&state, &upload.bytes).await?;
    Ok(Json(ExtractResponse::new(content)))
}

async fn read_upload(multipart: &mut Multipart) -> HttpResult<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(HttpError::validation_error("Uploaded file is empty"));
        }
        return Ok(Upload { file_name, bytes });
    }

    Err(HttpError::validation_error(format!(
        "Field '{}' is required",
        UPLOAD_FIELD
    )))
}

fn multipart_error(err: MultipartError) -> HttpError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HttpError::payload_too_large(err.body_text())
    } else {
        HttpError::bad_request(err.body_text())
    }
}

/// `_<name>`, keeping only the last component of the client's file name.
pub fn upload_suffix(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_FILE_NAME);
    format!("_{}", base)
}

/// Writes the upload to a uniquely named `temp<random>_<name>` file inside `temp_dir`.
async fn persist_upload(temp_dir: &Path, upload: &Upload) -> HttpResult<NamedTempFile> {
    let temp_dir = temp_dir.to_path_buf();
    let suffix = upload_suffix(&upload.file_name);
    let bytes = upload.bytes.clone();

    let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
        std::fs::create_dir_all(&temp_dir)?;
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&temp_dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(|e| HttpError::internal(format!("Upload writer failed: {}", e)))??;

    debug!(path = %file.path().display(), "Stored upload");
    Ok(file)
}

async fn process_document(state: &AppState, bytes: &[u8]) -> HttpResult<String> {
    let analyzed = state.analyzer.analyze(bytes, OCTET_STREAM).await?;
    let layout = DocumentLayout::from_analyze_result(&analyzed, document_id(bytes));
    let content_by_page = page_content(&analyzed);
    info!(
        document_id = %layout.document_id,
        lines = layout.lines.len(),
        "OCR layout parsed"
    );

    let pages = state
        .renderer
        .render(bytes, state.pipeline_config.render_dpi)
        .await?;

    let mut images = Vec::with_capacity(pages.len());
    let mut ocr_texts = Vec::with_capacity(pages.len());
    for page in pages {
        ocr_texts.push(
            content_by_page
                .get(&page.page_number)
                .cloned()
                .unwrap_or_default(),
        );
        images.push(page.image);
    }

    let document = ExtractionDocument {
        images,
        ocr_texts,
        layout: Some(layout),
    };
    let output = state.pipeline.run(&document).await?;
    Ok(output.to_content_string()?)
}
