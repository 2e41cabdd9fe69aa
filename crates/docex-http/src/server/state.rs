use crate::config::HttpConfig;
use docex_core::PipelineConfig;
use docex_extract::{DocumentAnalyzer, ExtractionPipeline, PageRenderer};
use std::sync::Arc;
use std::time::Instant;

/// Shared handles every request handler works with
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<dyn DocumentAnalyzer>,
    pub renderer: Arc<dyn PageRenderer>,
    pub pipeline: Arc<ExtractionPipeline>,
    pub pipeline_config: Arc<PipelineConfig>,
    pub http_config: Arc<HttpConfig>,
    pub service_name: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        analyzer: Arc<dyn DocumentAnalyzer>,
        renderer: Arc<dyn PageRenderer>,
        pipeline: ExtractionPipeline,
        pipeline_config: PipelineConfig,
        http_config: HttpConfig,
    ) -> Self {
        Self {
            analyzer,
            renderer,
            pipeline: Arc::new(pipeline),
            pipeline_config: Arc::new(pipeline_config),
            http_config: Arc::new(http_config),
            service_name: docex_core::SERVICE_NAME.to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}
