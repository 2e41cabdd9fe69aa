//! # docex-azure
//!
//! reqwest clients for the Azure services behind docex: Document Intelligence
//! for OCR layout analysis and Azure OpenAI for chat completions.

pub mod document_intelligence;
pub mod error;
pub mod openai;

pub use document_intelligence::DocumentIntelligenceClient;
pub use error::AzureError;
pub use openai::AzureOpenAiClient;
