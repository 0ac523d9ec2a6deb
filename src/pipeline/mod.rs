//! Pipeline stages for a resume review.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! is testable on its own and collaborators (pdfium, the model) can be
//! swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ request ──▶ postprocess
//!  (file)   (render+encode)  (model)     (HTML cleanup)
//! ```
//!
//! 1. [`input`]: the uploaded bytes, media type and name
//! 2. [`normalize`]: one part for an image; one rasterised page per part for
//!    a PDF ([`render`] runs in `spawn_blocking`, [`encode`] base64-wraps)
//! 3. [`request`]: the single model call with the mode's fixed instruction
//! 4. [`postprocess`]: fence stripping and HTML sanitising

pub mod encode;
pub mod input;
pub mod normalize;
pub mod postprocess;
pub mod render;
pub mod request;
