//! Page rasterization.
//!
//! PDFs are rendered page by page through pdfium; every other upload is decoded
//! as a single image and treated as page 1.

use crate::error::ExtractError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageOutputFormat};
use std::io::Cursor;

/// Resolution PDF user space is defined at
pub const PDF_POINTS_PER_INCH: u32 = 72;

const PDF_MAGIC: &[u8] = b"%PDF";
const JPEG_QUALITY: u8 = 75;

#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based
    pub page_number: u32,
    pub image: DynamicImage,
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, bytes: &[u8], dpi: u32) -> Result<Vec<PageImage>, ExtractError>;
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Whole-number scale factor applied to PDF pages for a target resolution
pub fn pdf_scale(dpi: u32) -> u32 {
    (dpi / PDF_POINTS_PER_INCH).max(1)
}

/// Decodes a non-PDF upload as a single page.
pub fn decode_image(bytes: &[u8]) -> Result<Vec<PageImage>, ExtractError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ExtractError::render(format!("Failed to decode image: {}", e)))?;
    Ok(vec![PageImage {
        page_number: 1,
        image,
    }])
}

/// JPEG encodes an image (as RGB) and returns it as standard base64.
pub fn encode_jpeg_base64(image: &DynamicImage) -> Result<String, ExtractError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut output = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut output), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| ExtractError::render(format!("Failed to encode page as JPEG: {}", e)))?;
    Ok(STANDARD.encode(output))
}

/// Renderer for deployments without pdfium: decodes images, rejects PDFs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOnlyRenderer;

#[async_trait]
impl PageRenderer for ImageOnlyRenderer {
    async fn render(&self, bytes: &[u8], _dpi: u32) -> Result<Vec<PageImage>, ExtractError> {
        if is_pdf(bytes) {
            return Err(ExtractError::render(
                "PDF rendering is not available in this build",
            ));
        }
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || decode_image(&bytes)).await?
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRenderer;

#[cfg(feature = "pdfium")]
mod pdfium {
    use super::*;
    use docex_core::PipelineConfig;
    use image::RgbaImage;
    use pdfium_render::prelude::*;
    use std::path::PathBuf;

    /// Renders PDFs with a pdfium library bound at render time
    #[derive(Debug, Clone, Default)]
    pub struct PdfiumRenderer {
        library_path: Option<PathBuf>,
    }

    impl PdfiumRenderer {
        /// Uses the pdfium library under `library_path`, or the system library when `None`.
        pub fn new(library_path: Option<PathBuf>) -> Self {
            Self { library_path }
        }

        pub fn from_config(config: &PipelineConfig) -> Self {
            Self::new(config.pdfium_library_path.clone())
        }

        /// Checks that a pdfium library can be bound.
        pub fn probe(&self) -> Result<(), ExtractError> {
            bind(self.library_path.as_ref()).map(|_| ())
        }
    }

    fn bind(library_path: Option<&PathBuf>) -> Result<Pdfium, ExtractError> {
        let bindings = match library_path {
            Some(path) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractError::render(format!("Failed to load pdfium: {}", e)))?;
        Ok(Pdfium::new(bindings))
    }

    fn render_pdf(
        bytes: &[u8],
        dpi: u32,
        library_path: Option<&PathBuf>,
    ) -> Result<Vec<PageImage>, ExtractError> {
        let pdfium = bind(library_path)?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ExtractError::render(format!("Failed to open PDF: {}", e)))?;
        let config = PdfRenderConfig::new().scale_page_by_factor(pdf_scale(dpi) as f32);

        let mut pages = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let page_number = index as u32 + 1;
            let bitmap = page.render_with_config(&config).map_err(|e| {
                ExtractError::render(format!("Failed to render page {}: {}", page_number, e))
            })?;
            let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
            let buffer = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(
                || ExtractError::render(format!("Page {} bitmap has unexpected size", page_number)),
            )?;
            pages.push(PageImage {
                page_number,
                image: DynamicImage::ImageRgba8(buffer),
            });
        }

        tracing::debug!(pages = pages.len(), dpi, "Rendered PDF pages");
        Ok(pages)
    }

    #[async_trait]
    impl PageRenderer for PdfiumRenderer {
        async fn render(&self, bytes: &[u8], dpi: u32) -> Result<Vec<PageImage>, ExtractError> {
            let bytes = bytes.to_vec();
            if !is_pdf(&bytes) {
                return tokio::task::spawn_blocking(move || decode_image(&bytes)).await?;
            }
            let library_path = self.library_path.clone();
            tokio::task::spawn_blocking(move || render_pdf(&bytes, dpi, library_path.as_ref()))
                .await?
        }
    }
}
