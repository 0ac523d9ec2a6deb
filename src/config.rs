//! Configuration types for a resume review.
//!
//! Every knob lives in [`ReviewConfig`], built via [`ReviewConfigBuilder`].
//! Collaborators (the model client, the PDF rasteriser, the progress
//! callback) are injected through the same struct so tests can swap them for
//! fakes without touching the pipeline.

use crate::error::ReviewError;
use crate::model::ReviewModel;
use crate::pipeline::render::PageRasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variables checked (in order) for the Gemini API key.
pub const API_KEY_ENV_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY", "GOOGLE_API_KEY"];

/// Default model id for the native Gemini client.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default base URL of the Generative Language API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for a review request.
///
/// Built via [`ReviewConfig::builder()`] or using [`ReviewConfig::default()`].
///
/// # Example
/// ```rust
/// use resume_review::ReviewConfig;
///
/// let config = ReviewConfig::builder()
///     .api_key("test-key")
///     .render_scale(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.generation.top_k, 32);
/// ```
#[derive(Clone)]
pub struct ReviewConfig {
    /// Model identifier. Default: `gemini-2.0-flash`.
    pub model: String,

    /// Named provider routed through `edgequake-llm` (e.g. "openai").
    /// If None, the native Gemini client is used.
    pub provider_name: Option<String>,

    /// Pre-constructed model client. Takes precedence over `provider_name`.
    pub model_client: Option<Arc<dyn ReviewModel>>,

    /// API key for the native Gemini client.
    pub api_key: Option<String>,

    /// Base URL of the Generative Language API.
    pub api_base_url: String,

    /// Sampling parameters sent with every request.
    pub generation: GenerationConfig,

    /// Magnification applied to the PDF page size (in points) when
    /// rasterising. Range: 0.25–8.0. Default: 1.5.
    pub render_scale: f32,

    /// Image format for rasterised PDF pages. Default: PNG.
    pub page_image_format: PageImageFormat,

    /// Optional cap on either edge of a rendered page, in pixels.
    pub max_page_pixels: Option<u32>,

    /// Pre-constructed PDF rasteriser. If None, pdfium is bound on demand.
    pub rasterizer: Option<Arc<dyn PageRasterizer>>,

    /// Explicit path to the pdfium shared library (file or directory).
    pub pdfium_lib_path: Option<PathBuf>,

    /// Timeout for the model call in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Sanitise the model's HTML before it is displayed. Default: true.
    pub sanitize_html: bool,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            model_client: None,
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            generation: GenerationConfig::default(),
            render_scale: 1.5,
            page_image_format: PageImageFormat::default(),
            max_page_pixels: None,
            rasterizer: None,
            pdfium_lib_path: None,
            request_timeout_secs: 120,
            sanitize_html: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("model_client", &self.model_client.as_ref().map(|_| "<dyn ReviewModel>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("generation", &self.generation)
            .field("render_scale", &self.render_scale)
            .field("page_image_format", &self.page_image_format)
            .field("max_page_pixels", &self.max_page_pixels)
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn PageRasterizer>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("sanitize_html", &self.sanitize_html)
            .finish()
    }
}

impl ReviewConfig {
    /// Create a new builder for `ReviewConfig`.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the API key taken from the environment.
    pub fn from_env() -> Self {
        Self {
            api_key: api_key_from_env(),
            ..Self::default()
        }
    }
}

/// First non-empty value among [`API_KEY_ENV_VARS`].
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
}

/// Builder for [`ReviewConfig`].
#[derive(Debug)]
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl ReviewConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model_client(mut self, client: Arc<dyn ReviewModel>) -> Self {
        self.config.model_client = Some(client);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Fill `api_key` from the environment if it is not set yet.
    pub fn api_key_from_env(mut self) -> Self {
        if self.config.api_key.is_none() {
            self.config.api_key = api_key_from_env();
        }
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.generation.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.generation.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.generation.top_k = k.max(1);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.generation.max_output_tokens = n.max(1);
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.25, 8.0);
        self
    }

    pub fn page_image_format(mut self, format: PageImageFormat) -> Self {
        self.config.page_image_format = format;
        self
    }

    pub fn max_page_pixels(mut self, px: u32) -> Self {
        self.config.max_page_pixels = Some(px.max(100));
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn sanitize_html(mut self, v: bool) -> Self {
        self.config.sanitize_html = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, ReviewError> {
        let c = &self.config;
        if !(0.25..=8.0).contains(&c.render_scale) {
            return Err(ReviewError::InvalidConfig(format!(
                "Render scale must be 0.25–8.0, got {}",
                c.render_scale
            )));
        }
        if c.model.trim().is_empty() {
            return Err(ReviewError::InvalidConfig("Model id must not be empty".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(ReviewError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        c.generation.validate()?;
        Ok(self.config)
    }
}

// ── Generation parameters ────────────────────────────────────────────────

/// Sampling parameters for the model call.
///
/// Serialises with the Generative Language API field names, so it can be
/// embedded in the request body as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: 4096,
        }
    }
}

impl GenerationConfig {
    fn validate(&self) -> Result<(), ReviewError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ReviewError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ReviewError::InvalidConfig(format!(
                "top-p must be 0.0–1.0, got {}",
                self.top_p
            )));
        }
        if self.top_k == 0 || self.max_output_tokens == 0 {
            return Err(ReviewError::InvalidConfig(
                "top-k and max output tokens must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Image format used for rasterised PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageImageFormat {
    /// Lossless; keeps small print crisp. (default)
    #[default]
    Png,
    /// Smaller payloads for very long documents.
    Jpeg,
}

impl PageImageFormat {
    pub fn media_type(self) -> &'static str {
        match self {
            PageImageFormat::Png => "image/png",
            PageImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            PageImageFormat::Png => image::ImageFormat::Png,
            PageImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl std::str::FromStr for PageImageFormat {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(PageImageFormat::Png),
            "jpeg" | "jpg" => Ok(PageImageFormat::Jpeg),
            other => Err(ReviewError::InvalidConfig(format!(
                "Unknown page image format '{other}' (expected png or jpeg)"
            ))),
        }
    }
}
