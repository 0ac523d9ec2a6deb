//! End-to-end tests against the real pdfium library and the live model API.
//!
//! They are gated behind the `E2E_ENABLED` environment variable so they do
//! not run in CI unless explicitly requested. The model tests also need
//! `GEMINI_API_KEY`, and read fixtures from `./test_cases/`.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture

use resume_review::{
    prepare, review_file, PageRasterizer, PdfiumRasterizer, RenderOptions, ReviewConfig,
    ReviewError, ReviewMode, UploadedDocument,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

/// Skip unless e2e is enabled, an API key is present and `$path` exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        e2e_skip_unless_enabled!();
        if resume_review::config::api_key_from_env().is_none() {
            println!("SKIP — set GEMINI_API_KEY to run live model tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// A minimal two-page PDF (US Letter), enough for pdfium to open and render.
fn two_page_pdf() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >>",
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>",
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>",
    ];
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
    }
    let xref_at = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    pdf
}

/// Assert the review looks like displayable HTML.
fn assert_review_quality(html: &str, context: &str) {
    assert!(!html.trim().is_empty(), "[{context}] Review is empty");
    assert!(
        !html.starts_with("```"),
        "[{context}] Review must not start with a code fence"
    );
    assert!(html.contains('<'), "[{context}] Review contains no markup");
    assert!(
        !html.to_ascii_lowercase().contains("<script"),
        "[{context}] Review was not sanitised"
    );
    println!("[{context}] ✓  {} chars", html.len());
}

// ── pdfium only (no API key) ─────────────────────────────────────────────────

#[tokio::test]
async fn test_pdfium_renders_every_page_in_order() {
    e2e_skip_unless_enabled!();

    let rasterizer = PdfiumRasterizer::default();
    let mut sizes = Vec::new();
    let total = rasterizer
        .rasterize("two.pdf", &two_page_pdf(), &RenderOptions::default(), &mut |page, total, img| {
            sizes.push((page, total, img.width(), img.height()));
            Ok(())
        })
        .expect("pdfium should render the fixture");

    assert_eq!(total, 2);
    // 612×792 pt at 1.5× scale.
    assert_eq!(sizes, vec![(1, 2, 918, 1188), (2, 2, 918, 1188)]);
}

#[tokio::test]
async fn test_prepare_pdf_yields_png_parts() {
    e2e_skip_unless_enabled!();

    let doc = UploadedDocument::new(two_page_pdf(), "application/pdf", "two.pdf");
    let parts = prepare(doc, &ReviewConfig::default())
        .await
        .expect("prepare() should succeed");

    assert_eq!(parts.len(), 2);
    for part in &parts {
        assert_eq!(part.media_type, "image/png");
        assert_eq!(&part.decoded().unwrap()[..4], b"\x89PNG");
    }
}

#[tokio::test]
async fn test_garbage_pdf_is_render_error() {
    e2e_skip_unless_enabled!();

    let doc = UploadedDocument::new(b"%PDF-1.4 this is not a pdf".to_vec(), "application/pdf", "bad.pdf");
    let err = prepare(doc, &ReviewConfig::default()).await.unwrap_err();
    assert!(
        matches!(err, ReviewError::CorruptPdf { .. } | ReviewError::PdfiumBindingFailed(_)),
        "unexpected error: {err}"
    );
}

// ── Live model ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_roast_pdf_resume() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("resume.pdf"));

    let output = review_file(&path, ReviewMode::Roast, &ReviewConfig::from_env())
        .await
        .expect("review should succeed");

    assert!(output.stats.parts >= 1);
    assert!(output.stats.output_tokens > 0);
    assert_review_quality(&output.result.html, "roast/pdf");
}

#[tokio::test]
async fn test_professional_image_resume() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("resume.png"));

    let output = review_file(&path, ReviewMode::Professional, &ReviewConfig::from_env())
        .await
        .expect("review should succeed");

    assert_eq!(output.stats.parts, 1);
    assert_review_quality(&output.result.html, "professional/png");
}

#[tokio::test]
async fn test_invalid_api_key_is_auth_error() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("resume.png"));

    let config = ReviewConfig::builder().api_key("not-a-real-key").build().unwrap();
    let err = review_file(&path, ReviewMode::Roast, &config).await.unwrap_err();
    assert_eq!(err.kind(), resume_review::ErrorKind::Model);
}
