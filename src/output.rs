//! Output types returned by a review.

use crate::prompts::ReviewMode;
use serde::{Deserialize, Serialize};

/// The model's answer, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    /// Post-processed HTML (fences stripped, sanitised unless disabled).
    pub html: String,
    /// The model text exactly as it was returned.
    pub raw: String,
}

impl ReviewResult {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// Timing and token accounting for one review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    /// Number of parts sent before the instruction (1 for an image, N for an N-page PDF).
    pub parts: usize,
    /// Total decoded size of all parts, in bytes.
    pub payload_bytes: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub normalize_duration_ms: u64,
    pub model_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a single review produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutput {
    pub document: String,
    pub mode: ReviewMode,
    /// Label of the model client that answered.
    pub model: String,
    pub result: ReviewResult,
    pub stats: ReviewStats,
}
