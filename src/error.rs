//! Error types for the resume-review library.
//!
//! A single [`ReviewError`] enum covers every failure the pipeline can hit.
//! Variants are grouped by the stage that produced them, and
//! [`ReviewError::kind`] collapses them into the coarse [`ErrorKind`]
//! taxonomy callers usually branch on:
//!
//! * [`ErrorKind::Read`]: the uploaded file could not be read
//! * [`ErrorKind::Render`]: a PDF page could not be rasterised or encoded
//! * [`ErrorKind::Model`]: the external model call failed or returned nothing
//!
//! plus configuration, session (busy / nothing submitted) and internal errors.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the resume-review library.
#[derive(Debug, Error)]
pub enum ReviewError {
    // ── Read errors ───────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Resume file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the upload.
    #[error("Error reading file '{name}': {detail}")]
    ReadFailed { name: String, detail: String },

    /// The upload contained zero bytes.
    #[error("File '{name}' is empty")]
    EmptyDocument { name: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// pdfium could not open the document at all.
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rendered page could not be encoded as an image file.
    #[error("Image encoding failed for page {page}: {detail}")]
    ImageEncodingFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF resumes are rasterised with PDFium. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n\
Prebuilt libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Model errors ──────────────────────────────────────────────────────
    /// The model API returned a non-success response.
    #[error("Model API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    ModelApi { status: Option<u16>, message: String },

    /// The model API rejected the credentials (401/403).
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The model API returned HTTP 429.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The model call did not complete within the configured timeout.
    #[error("Model call timed out after {secs}s")]
    ModelTimeout { secs: u64 },

    /// The model refused the prompt (safety filter or similar).
    #[error("Model blocked the request: {reason}")]
    Blocked { reason: String },

    /// The model answered but without any usable text.
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The configured provider cannot be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No API key was configured for the native Gemini client.
    #[error("No API key configured.\nSet GEMINI_API_KEY (or GOOGLE_AI_API_KEY) or pass --api-key.")]
    MissingApiKey,

    // ── Session errors ────────────────────────────────────────────────────
    /// A review is already in flight for this session.
    #[error("A review is already being generated; wait for it to finish")]
    Busy,

    /// Submit was triggered without a file.
    #[error("No resume file was provided")]
    NoDocument,

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ReviewError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Read,
    Render,
    Model,
    Config,
    Session,
    Internal,
}

impl ReviewError {
    /// Which stage of the pipeline this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use ReviewError::*;
        match self {
            FileNotFound { .. } | PermissionDenied { .. } | ReadFailed { .. } | EmptyDocument { .. } => {
                ErrorKind::Read
            }
            CorruptPdf { .. }
            | RasterisationFailed { .. }
            | ImageEncodingFailed { .. }
            | PdfiumBindingFailed(_) => ErrorKind::Render,
            ModelApi { .. }
            | AuthError { .. }
            | RateLimitExceeded { .. }
            | ModelTimeout { .. }
            | Blocked { .. }
            | EmptyResponse
            | ProviderNotConfigured { .. } => ErrorKind::Model,
            InvalidConfig(_) | MissingApiKey => ErrorKind::Config,
            Busy | NoDocument => ErrorKind::Session,
            Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_api_display_with_status() {
        let e = ReviewError::ModelApi {
            status: Some(500),
            message: "backend overloaded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 500"), "got: {msg}");
        assert!(msg.contains("backend overloaded"));
    }

    #[test]
    fn model_api_display_without_status() {
        let e = ReviewError::ModelApi {
            status: None,
            message: "connection reset".into(),
        };
        assert_eq!(e.to_string(), "Model API error: connection reset");
    }

    #[test]
    fn rasterisation_display() {
        let e = ReviewError::RasterisationFailed {
            page: 3,
            detail: "bitmap alloc".into(),
        };
        assert!(e.to_string().contains("page 3"));
    }

    #[test]
    fn kinds_follow_pipeline_stage() {
        assert_eq!(
            ReviewError::ReadFailed {
                name: "cv.png".into(),
                detail: "eof".into()
            }
            .kind(),
            ErrorKind::Read
        );
        assert_eq!(
            ReviewError::EmptyDocument { name: "cv.png".into() }.kind(),
            ErrorKind::Read
        );
        assert_eq!(
            ReviewError::CorruptPdf {
                name: "cv.pdf".into(),
                detail: "xref".into()
            }
            .kind(),
            ErrorKind::Render
        );
        assert_eq!(ReviewError::EmptyResponse.kind(), ErrorKind::Model);
        assert_eq!(ReviewError::ModelTimeout { secs: 5 }.kind(), ErrorKind::Model);
        assert_eq!(ReviewError::MissingApiKey.kind(), ErrorKind::Config);
        assert_eq!(ReviewError::Busy.kind(), ErrorKind::Session);
        assert_eq!(ReviewError::NoDocument.kind(), ErrorKind::Session);
    }

    #[test]
    fn auth_error_display() {
        let e = ReviewError::AuthError {
            provider: "gemini".into(),
            detail: "API key not valid".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("API key not valid"));
    }
}
