//! Normalisation: an [`UploadedDocument`] → ordered [`ModelInputPart`]s.
//!
//! * Plain images become exactly one part with the declared media type.
//! * PDFs are rasterised page by page (1..N, ascending) and every page is
//!   encoded as its own part. Order matters: the parts are concatenated
//!   positionally and the model has no other way to know the page sequence.

use crate::config::{PageImageFormat, ReviewConfig};
use crate::error::ReviewError;
use crate::pipeline::encode::{encode_bytes, encode_page, ModelInputPart};
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::render::{PageRasterizer, PdfiumRasterizer, RenderOptions};
use crate::progress::ProgressCallback;
use std::sync::Arc;
use tracing::{debug, info};

/// Convert a document into model-ready parts.
///
/// # Errors
/// * Read errors: the document has no content
/// * Render errors: pdfium could not be bound, the PDF could not be opened,
///   has no pages, or a page failed to render/encode
pub async fn normalize(
    document: UploadedDocument,
    config: &ReviewConfig,
) -> Result<Vec<ModelInputPart>, ReviewError> {
    if document.is_empty() {
        return Err(ReviewError::EmptyDocument {
            name: document.name().to_string(),
        });
    }

    if !document.is_pdf() {
        debug!("'{}' is a plain {} upload", document.name(), document.media_type());
        return Ok(vec![encode_bytes(document.content(), document.media_type())]);
    }

    let rasterizer: Arc<dyn PageRasterizer> = match config.rasterizer {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(PdfiumRasterizer::new(config.pdfium_lib_path.clone())),
    };
    let options = RenderOptions {
        scale: config.render_scale,
        max_pixels: config.max_page_pixels,
    };

    let parts = rasterize_pdf(
        rasterizer,
        document,
        options,
        config.page_image_format,
        config.progress_callback.clone(),
    )
    .await?;

    info!("Normalised PDF into {} page images", parts.len());
    Ok(parts)
}

/// Rasterise and encode on a blocking thread; pdfium must not run on the
/// async executor.
async fn rasterize_pdf(
    rasterizer: Arc<dyn PageRasterizer>,
    document: UploadedDocument,
    options: RenderOptions,
    format: PageImageFormat,
    progress: Option<ProgressCallback>,
) -> Result<Vec<ModelInputPart>, ReviewError> {
    let name = document.name().to_string();
    let pdf = document.into_content();

    tokio::task::spawn_blocking(move || {
        let mut parts = Vec::new();
        let total = rasterizer.rasterize(&name, &pdf, &options, &mut |page_num, total_pages, image| {
            parts.push(encode_page(&image, format, page_num)?);
            if let Some(ref cb) = progress {
                cb.on_page_rendered(page_num, total_pages);
            }
            Ok(())
        })?;

        if total == 0 {
            return Err(ReviewError::CorruptPdf {
                name,
                detail: "document has no pages".into(),
            });
        }
        Ok(parts)
    })
    .await
    .map_err(|e| ReviewError::Internal(format!("Render task panicked: {}", e)))?
}
