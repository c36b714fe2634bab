//! Provider traits for embedding and text completion.

use crate::error::LLMError;
use async_trait::async_trait;
use serde::Serialize;

/// Parameters of a single completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Vec<String>,
}

impl CompletionRequest {
    /// Request with deterministic defaults: temperature 0, top-p 1, 400 tokens, no penalties.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.0,
            max_tokens: 400,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: vec!["USER:".to_string(), "RAVEN:".to_string()],
        }
    }
}

#[async_trait]
/// Text to fixed-length vector.
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LLMError>;
}

#[async_trait]
/// Prompt to generated text.
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LLMError>;
}

/// A backend that serves both embeddings and completions.
pub trait LLMProvider: EmbeddingProvider + CompletionProvider {
    /// Service label used in error placeholders, e.g. `OpenAI error: ...`.
    fn name(&self) -> &str;
}
