use crate::error::ExtractError;
use crate::layout::AnalyzeResult;
use async_trait::async_trait;

/// Content type sent with every upload; the service sniffs the real format.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Cloud OCR producing a layout analysis of an uploaded document
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, bytes: &[u8], content_type: &str)
        -> Result<AnalyzeResult, ExtractError>;
}
