//! Progress-callback trait for review events.
//!
//! Inject an [`Arc<dyn ReviewProgressCallback>`] via
//! [`crate::config::ReviewConfigBuilder::progress_callback`] to observe the
//! pipeline: document normalisation, each rasterised PDF page, the model call
//! and the final outcome. The CLI uses it to drive a terminal spinner; a web
//! front-end could forward the same events to a socket.
//!
//! # Example
//!
//! ```rust
//! use resume_review::{ReviewConfig, ReviewProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl ReviewProgressCallback for PageCounter {
//!     fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ReviewConfig::builder()
//!     .progress_callback(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the review pipeline as it advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: page events
/// are emitted from the blocking rasterisation thread.
pub trait ReviewProgressCallback: Send + Sync {
    /// Called once before the document is normalised.
    ///
    /// # Arguments
    /// * `name`: original file name
    /// * `media_type`: declared media type
    fn on_review_start(&self, name: &str, media_type: &str) {
        let _ = (name, media_type);
    }

    /// Called after a PDF page has been rasterised and encoded.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: pages in the document
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called just before the model request is sent.
    ///
    /// # Arguments
    /// * `part_count`: number of input parts preceding the instruction
    fn on_request_start(&self, part_count: usize) {
        let _ = part_count;
    }

    /// Called when the model returned usable text.
    ///
    /// # Arguments
    /// * `html_len`: byte length of the (post-processed) review
    fn on_review_complete(&self, html_len: usize) {
        let _ = html_len;
    }

    /// Called when any stage failed.
    fn on_review_failed(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReviewProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReviewConfig`].
pub type ProgressCallback = Arc<dyn ReviewProgressCallback>;
