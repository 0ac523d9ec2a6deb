//! Native client for the Google Generative Language API (`generateContent`).
//!
//! ## Request layout
//!
//! A single `user` turn whose parts are, in order:
//! 1. one `inlineData` part per [`ModelInputPart`] (base64 + MIME type)
//! 2. one `text` part carrying the review instruction
//!
//! plus a `generationConfig` object with temperature, top-p, top-k and the
//! output-token cap. The answer is the concatenated text of the first
//! candidate. No retries, no streaming.

use crate::config::{GenerationConfig, ReviewConfig};
use crate::error::ReviewError;
use crate::model::{ModelRequest, ModelResponse, RequestItem, ReviewModel};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Native Gemini client.
pub struct GeminiModel {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    generation: GenerationConfig,
    timeout_secs: u64,
}

impl std::fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiModel")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("generation", &self.generation)
            .finish()
    }
}

impl GeminiModel {
    /// Provider label used in logs and errors.
    pub const PROVIDER: &'static str = "gemini";

    /// Build a client from the review configuration.
    ///
    /// # Errors
    /// [`ReviewError::MissingApiKey`] when `config.api_key` is unset or blank.
    pub fn from_config(config: &ReviewConfig) -> Result<Self, ReviewError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ReviewError::MissingApiKey)?
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ReviewError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.trim_start_matches("models/").to_string(),
            generation: config.generation,
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ReviewModel for GeminiModel {
    fn name(&self) -> &str {
        Self::PROVIDER
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ReviewError> {
        let body = build_request_body(request, self.generation);
        let start = Instant::now();

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReviewError::ModelTimeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ReviewError::ModelApi {
                        status: None,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Gemini returned HTTP {}", status);
            return Err(status_error(status, &text, retry_after));
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| ReviewError::ModelApi {
                status: Some(status.as_u16()),
                message: format!("Failed to parse response body: {e}"),
            })?;

        let result = extract_response(parsed)?;
        debug!(
            "Gemini: {} input tokens, {} output tokens, {:?}",
            result.input_tokens,
            result.output_tokens,
            start.elapsed()
        );
        Ok(result)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn build_request_body(request: &ModelRequest, generation: GenerationConfig) -> GenerateContentRequest<'_> {
    let parts = request
        .items()
        .map(|item| match item {
            RequestItem::Part(part) => WirePart::InlineData {
                inline_data: InlineData {
                    mime_type: &part.media_type,
                    data: &part.data,
                },
            },
            RequestItem::Instruction(text) => WirePart::Text { text },
        })
        .collect();

    GenerateContentRequest {
        contents: vec![Content { role: "user", parts }],
        generation_config: generation,
    }
}

/// The text accessor: concatenated text parts of the first candidate.
fn extract_response(response: GenerateContentResponse) -> Result<ModelResponse, ReviewError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(ReviewError::Blocked { reason });
    }

    let (input_tokens, output_tokens) = response
        .usage_metadata
        .as_ref()
        .map(|u| (u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ReviewError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                Err(ReviewError::Blocked {
                    reason: reason.to_string(),
                })
            }
            _ => Err(ReviewError::EmptyResponse),
        };
    }

    Ok(ModelResponse {
        text,
        input_tokens,
        output_tokens,
    })
}

fn status_error(status: StatusCode, body: &str, retry_after_secs: Option<u64>) -> ReviewError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReviewError::AuthError {
            provider: GeminiModel::PROVIDER.to_string(),
            detail: message,
        },
        StatusCode::TOO_MANY_REQUESTS => ReviewError::RateLimitExceeded {
            provider: GeminiModel::PROVIDER.to_string(),
            retry_after_secs,
        },
        _ => ReviewError::ModelApi {
            status: Some(status.as_u16()),
            message,
        },
    }
}
