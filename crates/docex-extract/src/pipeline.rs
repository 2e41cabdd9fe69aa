//! The multimodal extraction pipeline.
//!
//! `pre_process` classifies the document and encodes its pages, `inference`
//! builds a page by page knowledge base and maps it onto the field catalog,
//! and `post_process` locates the mapped values on the OCR lines.

use crate::chat::ChatModel;
use crate::error::ExtractError;
use crate::layout::DocumentLayout;
use crate::mapping::MappingCatalog;
use crate::matching::{locate_fields, FieldRegion};
use crate::render::encode_jpeg_base64;
use crate::services::form_type::UNKNOWN_FORM_TYPE;
use crate::services::{FormTypeService, KnowledgeBaseService, MappingService};
use image::DynamicImage;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;

/// Pages and OCR of one uploaded document
#[derive(Debug, Clone, Default)]
pub struct ExtractionDocument {
    pub images: Vec<DynamicImage>,
    /// OCR text per page, aligned with `images`
    pub ocr_texts: Vec<String>,
    pub layout: Option<DocumentLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreProcessOutput {
    pub form_type: String,
    pub base64_images: Vec<String>,
}

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutput {
    /// Mapping output, returned as is when no layout was available
    Raw(Value),
    Regions(Vec<FieldRegion>),
}

impl ExtractionOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(Value::Null) => true,
            Self::Raw(Value::Object(map)) => map.is_empty(),
            Self::Raw(Value::Array(items)) => items.is_empty(),
            Self::Raw(_) => false,
            Self::Regions(regions) => regions.is_empty(),
        }
    }

    /// JSON text of the output, `{}` when there is nothing to report.
    pub fn to_content_string(&self) -> Result<String, ExtractError> {
        if self.is_empty() {
            return Ok("{}".to_string());
        }
        Ok(serde_json::to_string(self)?)
    }
}

pub struct ExtractionPipeline {
    mapping_key: String,
    form_type: FormTypeService,
    knowledge_base: KnowledgeBaseService,
    mapping: MappingService,
}

impl ExtractionPipeline {
    /// Fails when `mapping_key` is not in the catalog.
    pub fn new(
        chat: Arc<dyn ChatModel>,
        catalog: &MappingCatalog,
        mapping_key: impl Into<String>,
    ) -> Result<Self, ExtractError> {
        let mapping_key = mapping_key.into();
        let fields = catalog.fields(&mapping_key)?.to_vec();

        Ok(Self {
            form_type: FormTypeService::new(chat.clone()),
            knowledge_base: KnowledgeBaseService::new(chat.clone()),
            mapping: MappingService::new(chat, fields),
            mapping_key,
        })
    }

    pub fn mapping_key(&self) -> &str {
        &self.mapping_key
    }

    pub async fn pre_process(
        &self,
        images: &[DynamicImage],
        ocr_texts: &[String],
    ) -> Result<PreProcessOutput, ExtractError> {
        let form_type = match ocr_texts.first() {
            Some(text) => self.form_type.identify_form_type(text).await?,
            None => UNKNOWN_FORM_TYPE.to_string(),
        };

        let base64_images = images
            .iter()
            .map(encode_jpeg_base64)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PreProcessOutput {
            form_type,
            base64_images,
        })
    }

    pub async fn inference(
        &self,
        pre: &PreProcessOutput,
        ocr_texts: &[String],
    ) -> Result<Value, ExtractError> {
        let mut knowledge_base = String::new();
        let mut previous_summary: Option<String> = None;

        for (index, image) in pre.base64_images.iter().enumerate() {
            let ocr_text = ocr_texts.get(index).map(String::as_str).unwrap_or("");
            let extraction = self
                .knowledge_base
                .initial_extraction(
                    image,
                    ocr_text,
                    previous_summary.as_deref(),
                    &pre.form_type,
                )
                .await?;
            knowledge_base.push_str(&extraction);
            knowledge_base.push_str("\n\n");
            previous_summary = Some(extraction);
        }

        self.mapping
            .final_mapping(&knowledge_base, &pre.form_type, &pre.base64_images)
            .await
    }

    pub fn post_process(
        &self,
        inference: Value,
        layout: Option<&DocumentLayout>,
    ) -> ExtractionOutput {
        let Some(layout) = layout else {
            return ExtractionOutput::Raw(inference);
        };

        let empty = Value::Object(Default::default());
        let extracted_fields = inference
            .get("chunk")
            .and_then(|chunk| chunk.get("extracted_fields"))
            .unwrap_or(&empty);

        ExtractionOutput::Regions(locate_fields(
            extracted_fields,
            self.mapping.fields(),
            layout,
        ))
    }

    pub async fn run(
        &self,
        document: &ExtractionDocument,
    ) -> Result<ExtractionOutput, ExtractError> {
        tracing::info!(
            pages = document.images.len(),
            mapping = %self.mapping_key,
            "Starting extraction pipeline"
        );

        let pre = step(
            "pre_process",
            self.pre_process(&document.images, &document.ocr_texts),
        )
        .await?;
        let inference = step("inference", self.inference(&pre, &document.ocr_texts)).await?;
        let output = step("post_process", async {
            Ok(self.post_process(inference, document.layout.as_ref()))
        })
        .await?;

        tracing::info!(form_type = %pre.form_type, "Extraction pipeline finished");
        Ok(output)
    }
}

async fn step<T, F>(name: &'static str, future: F) -> Result<T, ExtractError>
where
    F: Future<Output = Result<T, ExtractError>>,
{
    let span = tracing::info_span!("pipeline_step", step = name);
    async {
        let started = std::time::Instant::now();
        match future.await {
            Ok(value) => {
                tracing::info!(
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Step completed"
                );
                Ok(value)
            }
            Err(e) => {
                tracing::error!(error = %e, "Step failed");
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}
