//! In-process fakes for the model, OCR and rendering seams.

use crate::analyzer::DocumentAnalyzer;
use crate::chat::{ChatModel, ChatRequest};
use crate::error::ExtractError;
use crate::layout::{AnalyzeResult, AnalyzedLine, AnalyzedPage, DocumentLayout, Span};
use crate::render::{PageImage, PageRenderer};
use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Chat model answering from a fixed script and recording every request
#[derive(Debug, Default)]
pub struct ScriptedChat {
    responses: Mutex<VecDeque<Option<String>>>,
    failure: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(responses: Vec<Option<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    /// Every call fails with a provider error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, request: ChatRequest) -> Result<Option<String>, ExtractError> {
        lock(&self.requests).push(request);
        if let Some(message) = &self.failure {
            return Err(ExtractError::provider("scripted", message.clone()));
        }
        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| ExtractError::provider("scripted", "no scripted response left"))
    }
}

/// Analyzer returning a canned result
#[derive(Debug)]
pub struct StaticAnalyzer {
    result: Result<AnalyzeResult, String>,
    content_types: Mutex<Vec<String>>,
}

impl StaticAnalyzer {
    pub fn new(result: AnalyzeResult) -> Self {
        Self {
            result: Ok(result),
            content_types: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            content_types: Mutex::new(Vec::new()),
        }
    }

    /// Content type of every analyze call so far
    pub fn content_types(&self) -> Vec<String> {
        lock(&self.content_types).clone()
    }
}

#[async_trait]
impl DocumentAnalyzer for StaticAnalyzer {
    async fn analyze(
        &self,
        _bytes: &[u8],
        content_type: &str,
    ) -> Result<AnalyzeResult, ExtractError> {
        lock(&self.content_types).push(content_type.to_string());
        self.result
            .clone()
            .map_err(|message| ExtractError::provider("static", message))
    }
}

/// Renderer producing blank pages regardless of input
#[derive(Debug, Clone)]
pub struct BlankRenderer {
    pages: u32,
    failure: Option<String>,
}

impl BlankRenderer {
    pub fn new(pages: u32) -> Self {
        Self {
            pages,
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            pages: 0,
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl PageRenderer for BlankRenderer {
    async fn render(&self, _bytes: &[u8], _dpi: u32) -> Result<Vec<PageImage>, ExtractError> {
        if let Some(message) = &self.failure {
            return Err(ExtractError::render(message.clone()));
        }
        Ok((1..=self.pages)
            .map(|page_number| PageImage {
                page_number,
                image: DynamicImage::ImageRgb8(RgbImage::from_pixel(
                    17,
                    22,
                    Rgb([255, 255, 255]),
                )),
            })
            .collect())
    }
}

/// Single page bill of lading, one OCR line per row, in inches.
pub fn sample_analyze_result() -> AnalyzeResult {
    let rows = [
        ("BILL OF LADING", 1.0),
        ("Shipper: ACME Corp", 1.5),
        ("BOL Number: 123456588", 2.0),
        ("Consignee", 2.5),
        ("Eagle Manufacturer ltd", 2.8),
        ("Hazmat", 3.4),
    ];

    let mut content = String::new();
    let mut lines = Vec::new();
    for (text, y) in rows {
        if !content.is_empty() {
            content.push('\n');
        }
        let offset = content.chars().count();
        content.push_str(text);
        lines.push(AnalyzedLine {
            content: text.to_string(),
            polygon: vec![1.0, y - 0.2, 4.0, y - 0.2, 4.0, y, 1.0, y],
            spans: vec![Span {
                offset,
                length: text.chars().count(),
            }],
        });
    }

    let length = content.chars().count();
    AnalyzeResult {
        content,
        pages: vec![AnalyzedPage {
            page_number: 1,
            angle: Some(0.0),
            width: Some(8.5),
            height: Some(11.0),
            unit: Some("inch".to_string()),
            spans: vec![Span { offset: 0, length }],
            lines,
            words: Vec::new(),
        }],
    }
}

pub fn sample_layout() -> DocumentLayout {
    DocumentLayout::from_analyze_result(&sample_analyze_result(), "sample-document")
}
