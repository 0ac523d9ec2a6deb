//! [`ReviewModel`] over an `edgequake-llm` provider.
//!
//! The request becomes a single user message whose text is the instruction
//! and whose attachments are the input parts, in order. Providers that only
//! honour temperature and the token cap silently ignore top-p/top-k.

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::model::{ModelRequest, ModelResponse, ReviewModel};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct ProviderModel {
    label: String,
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Duration,
}

impl ProviderModel {
    /// Wrap an already-constructed provider.
    pub fn new(label: impl Into<String>, provider: Arc<dyn LLMProvider>, config: &ReviewConfig) -> Self {
        Self {
            label: label.into(),
            provider,
            options: build_options(config),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Instantiate `provider_name` with `config.model` via
    /// [`ProviderFactory::create_llm_provider`], which reads that provider's
    /// API key from its usual environment variable.
    pub fn from_factory(provider_name: &str, config: &ReviewConfig) -> Result<Self, ReviewError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, &config.model).map_err(|e| {
            ReviewError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider_name, provider, config))
    }
}

impl std::fmt::Debug for ProviderModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderModel")
            .field("label", &self.label)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl ReviewModel for ProviderModel {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ReviewError> {
        let messages = vec![build_message(request)];
        let start = Instant::now();

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&self.options)))
            .await
            .map_err(|_| ReviewError::ModelTimeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| {
                warn!("{}: request failed: {}", self.label, e);
                ReviewError::ModelApi {
                    status: None,
                    message: format!("{e}"),
                }
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ReviewError::EmptyResponse);
        }

        Ok(ModelResponse {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

fn build_message(request: &ModelRequest) -> ChatMessage {
    let images = request
        .parts
        .iter()
        .map(|p| ImageData::new(p.data.clone(), &p.media_type))
        .collect();
    ChatMessage::user_with_images(&request.instruction, images)
}

fn build_options(config: &ReviewConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.generation.temperature),
        max_tokens: Some(config.generation.max_output_tokens as usize),
        ..Default::default()
    }
}
