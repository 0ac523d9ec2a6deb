//! Review entry points.
//!
//! [`review`] runs the whole pipeline for one document: resolve the model,
//! normalise the upload into parts, send a single request, clean the answer.
//! [`prepare`] stops after normalisation and never touches the network.

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::model::resolve_model;
use crate::output::{ReviewOutput, ReviewStats};
use crate::pipeline::encode::ModelInputPart;
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::{normalize, request};
use crate::prompts::ReviewMode;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Review one uploaded resume.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// * Config errors: no API key / unknown provider (checked before any work)
/// * Read or Render errors from normalisation
/// * Model errors from the request
pub async fn review(
    document: UploadedDocument,
    mode: ReviewMode,
    config: &ReviewConfig,
) -> Result<ReviewOutput, ReviewError> {
    let result = run(document, mode, config).await;

    if let Some(ref cb) = config.progress_callback {
        match result {
            Ok(ref out) => cb.on_review_complete(out.result.html.len()),
            Err(ref e) => cb.on_review_failed(&e.to_string()),
        }
    }
    if let Err(ref e) = result {
        warn!("Review failed: {}", e);
    }
    result
}

async fn run(
    document: UploadedDocument,
    mode: ReviewMode,
    config: &ReviewConfig,
) -> Result<ReviewOutput, ReviewError> {
    let total_start = Instant::now();
    let name = document.name().to_string();
    info!(
        "Starting {} review of '{}' ({}, {} bytes)",
        mode,
        name,
        document.media_type(),
        document.len()
    );

    // ── Step 1: Resolve model ────────────────────────────────────────────
    let model = resolve_model(config)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_review_start(&name, document.media_type());
    }

    // ── Step 2: Normalise ────────────────────────────────────────────────
    let normalize_start = Instant::now();
    let parts = normalize::normalize(document, config).await?;
    let normalize_duration_ms = normalize_start.elapsed().as_millis() as u64;
    let part_count = parts.len();
    let payload_bytes = parts.iter().map(ModelInputPart::byte_len).sum();

    // ── Step 3: Request ──────────────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_request_start(part_count);
    }
    let model_start = Instant::now();
    let reply = request::request_review(model.as_ref(), parts, mode, config.sanitize_html).await?;
    let model_duration_ms = model_start.elapsed().as_millis() as u64;

    let stats = ReviewStats {
        parts: part_count,
        payload_bytes,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        normalize_duration_ms,
        model_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Review complete: {} parts, {} output tokens, {}ms total",
        stats.parts, stats.output_tokens, stats.total_duration_ms
    );

    Ok(ReviewOutput {
        document: name,
        mode,
        model: model.name().to_string(),
        result: reply.result,
        stats,
    })
}

/// Read a file from disk and review it.
pub async fn review_file(
    path: impl AsRef<Path>,
    mode: ReviewMode,
    config: &ReviewConfig,
) -> Result<ReviewOutput, ReviewError> {
    let document = UploadedDocument::from_path(path).await?;
    review(document, mode, config).await
}

/// Synchronous wrapper around [`review`].
///
/// Creates a temporary tokio runtime internally.
pub fn review_sync(
    document: UploadedDocument,
    mode: ReviewMode,
    config: &ReviewConfig,
) -> Result<ReviewOutput, ReviewError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReviewError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(review(document, mode, config))
}

/// Normalise a document without calling the model.
///
/// Does not require an API key.
pub async fn prepare(
    document: UploadedDocument,
    config: &ReviewConfig,
) -> Result<Vec<ModelInputPart>, ReviewError> {
    normalize::normalize(document, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelRequest, ModelResponse, ReviewModel};
    use crate::progress::ReviewProgressCallback;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct Echo;

    #[async_trait]
    impl ReviewModel for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ReviewError> {
            Ok(ModelResponse {
                text: format!("<p>{} parts</p>", request.parts.len()),
                input_tokens: 3,
                output_tokens: 2,
            })
        }
    }

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl ReviewProgressCallback for Events {
        fn on_review_start(&self, name: &str, _media_type: &str) {
            self.0.lock().unwrap().push(format!("start:{name}"));
        }
        fn on_request_start(&self, part_count: usize) {
            self.0.lock().unwrap().push(format!("request:{part_count}"));
        }
        fn on_review_complete(&self, _html_len: usize) {
            self.0.lock().unwrap().push("complete".into());
        }
        fn on_review_failed(&self, _error: &str) {
            self.0.lock().unwrap().push("failed".into());
        }
    }

    #[tokio::test]
    async fn image_review_reports_stats_and_events() {
        let events = Arc::new(Events::default());
        let config = ReviewConfig::builder()
            .model_client(Arc::new(Echo))
            .progress_callback(events.clone())
            .build()
            .unwrap();
        let doc = UploadedDocument::new(vec![1, 2, 3], "image/png", "cv.png");

        let out = review(doc, ReviewMode::Professional, &config).await.unwrap();

        assert_eq!(out.result.html, "<p>1 parts</p>");
        assert_eq!(out.model, "echo");
        assert_eq!(out.document, "cv.png");
        assert_eq!(out.stats.parts, 1);
        assert_eq!(out.stats.payload_bytes, 3);
        assert_eq!(out.stats.input_tokens, 3);
        assert_eq!(
            *events.0.lock().unwrap(),
            vec!["start:cv.png", "request:1", "complete"]
        );
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_normalising() {
        let events = Arc::new(Events::default());
        let config = ReviewConfig::builder()
            .progress_callback(events.clone())
            .build()
            .unwrap();
        // Empty content would be a Read error; the Config error must win.
        let doc = UploadedDocument::new(Vec::new(), "image/png", "cv.png");

        let err = review(doc, ReviewMode::Roast, &config).await.unwrap_err();
        assert!(matches!(err, ReviewError::MissingApiKey));
        assert_eq!(*events.0.lock().unwrap(), vec!["failed"]);
    }

    #[tokio::test]
    async fn prepare_needs_no_model() {
        let doc = UploadedDocument::new(vec![9; 16], "image/webp", "cv.webp");
        let parts = prepare(doc, &ReviewConfig::default()).await.unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].media_type, "image/webp");
    }

    #[test]
    fn review_sync_runs_outside_a_runtime() {
        let config = ReviewConfig::builder()
            .model_client(Arc::new(Echo))
            .build()
            .unwrap();
        let doc = UploadedDocument::new(vec![1], "image/jpeg", "cv.jpg");
        let out = review_sync(doc, ReviewMode::Roast, &config).unwrap();
        assert_eq!(out.mode, ReviewMode::Roast);
    }

    #[tokio::test]
    async fn review_file_reports_missing_path() {
        let err = review_file("/definitely/not/here.pdf", ReviewMode::Roast, &ReviewConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::FileNotFound { .. }));
    }
}
