//! # resume-review
//!
//! Review (or roast) a resume with a multimodal generative model.
//!
//! A resume arrives as an image or a PDF. Multimodal APIs only accept
//! images, so every PDF page is rasterised first; each image is then sent
//! as a base64 part, followed by one of two fixed instructions
//! ("professional review" or "roast"). The model answers in HTML, which is
//! cleaned and sanitised before display.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (image | PDF)
//!  │
//!  ├─ 1. Normalise  image → 1 part; PDF → pdfium render → 1 PNG part per page
//!  ├─ 2. Request    [part₁ … partₙ, instruction] → model (one call, no retries)
//!  └─ 3. Polish     strip fences, normalise, sanitise HTML
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_review::{review_file, ReviewConfig, ReviewMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GEMINI_API_KEY / GOOGLE_AI_API_KEY / GOOGLE_API_KEY
//!     let config = ReviewConfig::from_env();
//!     let output = review_file("resume.pdf", ReviewMode::Roast, &config).await?;
//!     println!("{}", output.result.html);
//!     eprintln!("{} pages, {} output tokens", output.stats.parts, output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | The [`web`] display surface (axum) |
//! | `cli`    | on      | The `resume-review` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable both when using only the library:
//! ```toml
//! resume-review = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod review;
pub mod session;
#[cfg(feature = "server")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, PageImageFormat, ReviewConfig, ReviewConfigBuilder};
pub use error::{ErrorKind, ReviewError};
pub use model::{GeminiModel, ModelRequest, ModelResponse, ProviderModel, ReviewModel};
pub use output::{ReviewOutput, ReviewResult, ReviewStats};
pub use pipeline::encode::ModelInputPart;
pub use pipeline::input::UploadedDocument;
pub use pipeline::render::{PageRasterizer, PdfiumRasterizer, RenderOptions};
pub use progress::{NoopProgressCallback, ProgressCallback, ReviewProgressCallback};
pub use prompts::ReviewMode;
pub use review::{prepare, review, review_file, review_sync};
pub use session::{ReviewSession, SessionSnapshot, SessionState};
