//! The external generative model, behind a trait.
//!
//! [`ReviewModel`] is the seam between the review pipeline and whatever
//! answers it. Two implementations ship with the crate:
//!
//! * [`GeminiModel`]: native REST client for the Generative Language API,
//!   honouring every generation parameter (temperature, top-p, top-k, max
//!   output tokens).
//! * [`ProviderModel`]: adapter over the `edgequake-llm` provider factory for
//!   other vision-capable backends.
//!
//! Tests implement the trait directly with canned answers.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiModel;
pub use provider::ProviderModel;

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::pipeline::encode::ModelInputPart;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// One element of the ordered request sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestItem<'a> {
    Part(&'a ModelInputPart),
    Instruction(&'a str),
}

/// A single model request: `[part₁, …, partₙ, instruction]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub parts: Vec<ModelInputPart>,
    pub instruction: String,
}

impl ModelRequest {
    pub fn new(parts: Vec<ModelInputPart>, instruction: impl Into<String>) -> Self {
        Self {
            parts,
            instruction: instruction.into(),
        }
    }

    /// The request in submission order; the instruction is always last.
    pub fn items(&self) -> impl Iterator<Item = RequestItem<'_>> {
        self.parts
            .iter()
            .map(RequestItem::Part)
            .chain(std::iter::once(RequestItem::Instruction(self.instruction.as_str())))
    }
}

/// Text and token accounting returned by a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelResponse {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A multimodal model that answers a [`ModelRequest`] with text.
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// Short provider label used in logs and errors.
    fn name(&self) -> &str;

    /// Send the request and wait for the complete answer.
    ///
    /// Implementations return a Model-kind [`ReviewError`] on transport or
    /// API failures and [`ReviewError::EmptyResponse`] when no text came back.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ReviewError>;
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.model_client`): used as-is; this is how
///    tests inject a fake.
/// 2. **Named provider** (`config.provider_name`): routed through the
///    `edgequake-llm` factory, which reads that provider's own API key. The
///    name `gemini-native` selects the built-in client instead.
/// 3. **Native Gemini**: requires `config.api_key`.
pub fn resolve_model(config: &ReviewConfig) -> Result<Arc<dyn ReviewModel>, ReviewError> {
    if let Some(ref client) = config.model_client {
        return Ok(Arc::clone(client));
    }

    if let Some(ref name) = config.provider_name {
        if !name.eq_ignore_ascii_case(GeminiModel::PROVIDER) && !name.eq_ignore_ascii_case("gemini-native") {
            debug!("Using edgequake-llm provider '{}' ({})", name, config.model);
            return Ok(Arc::new(ProviderModel::from_factory(name, config)?));
        }
    }

    Ok(Arc::new(GeminiModel::from_config(config)?))
}
