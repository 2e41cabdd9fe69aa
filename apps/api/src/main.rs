use anyhow::{Context, Result};
use docex_azure::{AzureOpenAiClient, DocumentIntelligenceClient};
use docex_core::{AppConfig, AppConfigTrait, PipelineConfig};
use docex_extract::{
    ExtractionPipeline, ImageOnlyRenderer, MappingCatalog, PageRenderer, PdfiumRenderer,
};
use docex_http::{
    build_router, init_logging, log_shutdown_info, log_startup_info, start_server, AppState,
    HttpConfig, LoggingConfig,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let http_config = HttpConfig::from_env().context("Failed to load HTTP configuration")?;
    http_config
        .validate()
        .context("Invalid HTTP configuration")?;

    let logging = LoggingConfig::from_settings(&config.logging)
        .with_service(&config.name, docex_core::VERSION);
    let json_logs = logging.json_format;
    init_logging(logging).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    log_startup_info(&config.name, docex_core::VERSION);
    tracing::info!(
        environment = %config.environment,
        mapping = %config.pipeline.mapping_key,
        temp_dir = %config.pipeline.temp_dir.display(),
        "Configuration loaded"
    );
    if config.environment.is_production() && !json_logs {
        tracing::warn!("Running in production without JSON logs (set LOG_FORMAT=json)");
    }
    for (field, source) in config.config_sources() {
        tracing::debug!(field = %field, source = %source.description(), "Configuration source");
    }

    let analyzer = DocumentIntelligenceClient::new(config.document_intelligence.clone())?;
    let chat = AzureOpenAiClient::new(config.openai.clone())?;
    let catalog = MappingCatalog::from_config(&config.pipeline)?;
    let pipeline = ExtractionPipeline::new(
        Arc::new(chat),
        &catalog,
        config.pipeline.mapping_key.clone(),
    )?;

    let state = AppState::new(
        Arc::new(analyzer),
        page_renderer(&config.pipeline),
        pipeline,
        config.pipeline.clone(),
        http_config.clone(),
    )
    .with_service_name(config.name.clone());

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address()))?;

    start_server(addr, build_router(state), http_config.shutdown_timeout()).await?;
    log_shutdown_info(&config.name);
    Ok(())
}

/// pdfium when the library can be loaded, image decoding only otherwise.
fn page_renderer(config: &PipelineConfig) -> Arc<dyn PageRenderer> {
    let pdfium = PdfiumRenderer::from_config(config);
    match pdfium.probe() {
        Ok(()) => Arc::new(pdfium),
        Err(e) => {
            tracing::warn!(error = %e, "pdfium unavailable, PDF uploads will be rejected");
            Arc::new(ImageOnlyRenderer)
        }
    }
}
