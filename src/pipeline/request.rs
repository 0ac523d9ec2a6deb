//! Review request: parts + the mode's fixed instruction → model → HTML.
//!
//! Exactly one call per review. There is no retry loop: a failed call is
//! surfaced to the caller as-is and the session decides what to show.

use crate::error::ReviewError;
use crate::model::{ModelRequest, ReviewModel};
use crate::output::ReviewResult;
use crate::pipeline::encode::ModelInputPart;
use crate::pipeline::postprocess;
use crate::prompts::ReviewMode;
use tracing::{debug, info};

/// A review answer plus the token usage the model reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReply {
    pub result: ReviewResult,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Assemble `[part₁, …, partₙ, instruction]` for `mode`.
pub fn build_request(parts: Vec<ModelInputPart>, mode: ReviewMode) -> ModelRequest {
    ModelRequest::new(parts, mode.instruction())
}

/// Send the parts with the instruction for `mode` and return the cleaned answer.
///
/// # Errors
/// Any Model-kind error from `model`, or [`ReviewError::EmptyResponse`] when
/// the answer is blank after cleanup.
pub async fn request_review(
    model: &dyn ReviewModel,
    parts: Vec<ModelInputPart>,
    mode: ReviewMode,
    sanitize: bool,
) -> Result<ReviewReply, ReviewError> {
    let request = build_request(parts, mode);
    info!(
        "Requesting {} review from {} ({} parts)",
        mode,
        model.name(),
        request.parts.len()
    );

    let response = model.generate(&request).await?;
    let result = ReviewResult {
        html: postprocess::clean_html(&response.text, sanitize),
        raw: response.text,
    };
    if result.is_empty() {
        return Err(ReviewError::EmptyResponse);
    }
    debug!("Review HTML: {} chars (raw {})", result.html.len(), result.raw.len());

    Ok(ReviewReply {
        result,
        input_tokens: response.input_tokens,
        output_tokens: response.output_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelResponse;
    use crate::pipeline::encode::encode_bytes;
    use crate::prompts::{PROFESSIONAL_PROMPT, ROAST_PROMPT};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the last request and answers with a fixed reply.
    struct Recording {
        reply: Result<String, ()>,
        seen: Mutex<Option<ModelRequest>>,
    }

    impl Recording {
        fn answering(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ReviewModel for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ReviewError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Ok(text) => Ok(ModelResponse {
                    text: text.clone(),
                    input_tokens: 10,
                    output_tokens: 5,
                }),
                Err(()) => Err(ReviewError::ModelApi {
                    status: Some(500),
                    message: "boom".into(),
                }),
            }
        }
    }

    #[test]
    fn instruction_depends_only_on_mode() {
        let parts = vec![encode_bytes(b"x", "image/png")];
        assert_eq!(build_request(parts.clone(), ReviewMode::Roast).instruction, ROAST_PROMPT);
        assert_eq!(
            build_request(parts, ReviewMode::Professional).instruction,
            PROFESSIONAL_PROMPT
        );
    }

    #[tokio::test]
    async fn sends_parts_then_instruction_and_cleans_reply() {
        let model = Recording::answering("```html\n<h1>Hi</h1>\n```");
        let parts = vec![encode_bytes(b"p1", "image/png"), encode_bytes(b"p2", "image/png")];

        let reply = request_review(&model, parts.clone(), ReviewMode::Roast, true)
            .await
            .unwrap();

        assert_eq!(reply.result.html, "<h1>Hi</h1>");
        assert_eq!(reply.result.raw, "```html\n<h1>Hi</h1>\n```");
        assert_eq!((reply.input_tokens, reply.output_tokens), (10, 5));

        let seen = model.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.parts, parts);
        assert_eq!(seen.instruction, ROAST_PROMPT);
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let model = Recording {
            reply: Err(()),
            seen: Mutex::new(None),
        };
        let err = request_review(&model, vec![], ReviewMode::Professional, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::ModelApi { status: Some(500), .. }));
    }

    #[tokio::test]
    async fn reply_that_sanitises_to_nothing_is_empty() {
        let model = Recording::answering("<script>alert(1)</script>");
        let err = request_review(&model, vec![], ReviewMode::Roast, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::EmptyResponse));
    }

    #[tokio::test]
    async fn fenced_whitespace_reply_is_empty() {
        let model = Recording::answering("```html\n  \n```");
        let err = request_review(&model, vec![], ReviewMode::Roast, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::EmptyResponse));
    }
}
