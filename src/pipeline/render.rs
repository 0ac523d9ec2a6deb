//! PDF rasterisation: render every page to a `DynamicImage`.
//!
//! The model only accepts images, so a PDF resume is turned into one raster
//! per page. Rendering is behind the [`PageRasterizer`] trait: production
//! code binds pdfium through `pdfium-render`, tests plug in a fake that
//! fabricates pages without any native library.
//!
//! Pages are delivered one at a time, in ascending order, to a sink closure.
//! The caller encodes each page immediately and drops the bitmap, so peak
//! memory stays at a single rendered page regardless of document length.
//!
//! The pdfium calls are blocking and CPU-bound; callers run them inside
//! `tokio::task::spawn_blocking`.

use crate::error::ReviewError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable pointing at an existing pdfium library (file or directory).
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// How pages are sized when rasterised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Multiplier applied to the page size in points.
    pub scale: f32,
    /// Optional cap on either edge, in pixels.
    pub max_pixels: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.5,
            max_pixels: None,
        }
    }
}

/// Receives `(page_num_1based, total_pages, image)` for every rendered page.
pub type PageSink<'a> = dyn FnMut(usize, usize, DynamicImage) -> Result<(), ReviewError> + 'a;

/// Turns PDF bytes into page images.
pub trait PageRasterizer: Send + Sync {
    /// Rasterise every page of `pdf` in ascending order, feeding each image to
    /// `sink` before rendering the next one.
    ///
    /// Returns the number of pages in the document. Errors from `sink` abort
    /// rendering and are returned unchanged.
    fn rasterize(
        &self,
        name: &str,
        pdf: &[u8],
        options: &RenderOptions,
        sink: &mut PageSink<'_>,
    ) -> Result<usize, ReviewError>;
}

/// [`PageRasterizer`] backed by the pdfium C++ library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    lib_path: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Bind pdfium from `lib_path` when given, otherwise from
    /// `PDFIUM_LIB_PATH`, the working directory, then the system library.
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        Self { lib_path }
    }

    fn library_path(&self) -> Option<PathBuf> {
        self.lib_path
            .clone()
            .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from))
            .filter(|p| !p.as_os_str().is_empty())
    }

    fn bind(&self) -> Result<Pdfium, ReviewError> {
        let bindings = match self.library_path() {
            Some(path) => {
                debug!("Binding pdfium from {}", path.display());
                Pdfium::bind_to_library(resolve_library_file(&path))
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ReviewError::PdfiumBindingFailed(e.to_string()))?;

        Ok(Pdfium::new(bindings))
    }
}

/// A directory is expanded to the platform library name inside it.
fn resolve_library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        let dir = path.to_string_lossy().to_string();
        PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&dir))
    } else {
        path.to_path_buf()
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        name: &str,
        pdf: &[u8],
        options: &RenderOptions,
        sink: &mut PageSink<'_>,
    ) -> Result<usize, ReviewError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| ReviewError::CorruptPdf {
                name: name.to_string(),
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let mut render_config = PdfRenderConfig::new().scale_page_by_factor(options.scale);
        if let Some(max) = options.max_pixels {
            render_config = render_config
                .set_maximum_width(max as i32)
                .set_maximum_height(max as i32);
        }

        for idx in 0..total_pages {
            let page = pages
                .get(idx as u16)
                .map_err(|e| ReviewError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ReviewError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );

            sink(idx + 1, total_pages, image)?;
        }

        Ok(total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_use_one_and_a_half_scale() {
        let opts = RenderOptions::default();
        assert_eq!(opts.scale, 1.5);
        assert_eq!(opts.max_pixels, None);
    }

    #[test]
    fn explicit_lib_path_wins_over_env() {
        let r = PdfiumRasterizer::new(Some(PathBuf::from("/opt/pdfium/libpdfium.so")));
        assert_eq!(
            r.library_path(),
            Some(PathBuf::from("/opt/pdfium/libpdfium.so"))
        );
    }

    #[test]
    fn file_path_is_used_verbatim() {
        let p = Path::new("/nonexistent/libpdfium.so");
        assert_eq!(resolve_library_file(p), p.to_path_buf());
    }

    #[test]
    fn directory_expands_to_platform_library() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_library_file(dir.path());
        assert!(resolved.starts_with(dir.path()));
        assert!(resolved.to_string_lossy().contains("pdfium"));
    }
}
