//! # docex-extract
//!
//! Turns an uploaded document into located form fields: OCR layout parsing,
//! page rendering, prompting a multimodal chat model, and matching the
//! model's answers back onto OCR lines.

pub mod analyzer;
pub mod chat;
pub mod error;
pub mod layout;
pub mod mapping;
pub mod matching;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod services;
pub mod similarity;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analyzer::{DocumentAnalyzer, OCTET_STREAM};
pub use chat::{ChatMessage, ChatModel, ChatRequest, ContentPart, MessageContent, Role};
pub use error::ExtractError;
pub use layout::{document_id, page_content, AnalyzeResult, DocumentLayout, LineRecord, WordRecord};
pub use mapping::{DataType, FieldSpec, MappingCatalog, DEFAULT_MAPPING};
pub use matching::{locate_fields, FieldRegion};
pub use pipeline::{ExtractionDocument, ExtractionOutput, ExtractionPipeline, PreProcessOutput};
pub use render::{encode_jpeg_base64, ImageOnlyRenderer, PageImage, PageRenderer};
#[cfg(feature = "pdfium")]
pub use render::PdfiumRenderer;
pub use services::{FormTypeService, KnowledgeBaseService, MappingService};
