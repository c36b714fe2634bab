//! OpenAI-compatible HTTP backend for embeddings and completions.

use crate::error::LLMError;
use crate::provider::{CompletionProvider, CompletionRequest, EmbeddingProvider, LLMProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default embedding model (1536 dimensions).
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// Default completion model.
pub const DEFAULT_COMPLETION_MODEL: &str = "text-davinci-003";

/// Client for the `/embeddings` and `/completions` endpoints.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: String,
    base_url: String,
    embedding_model: String,
    completion_model: String,
}

impl fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAI")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("completion_model", &self.completion_model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAI {
    /// Client against the public API with the default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_completion_model(mut self, model: impl Into<String>) -> Self {
        self.completion_model = model.into();
        self
    }

    /// Apply a per-request timeout to the underlying HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LLMError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn completion_model(&self) -> &str {
        &self.completion_model
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, LLMError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }
        Ok(text)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAI {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LLMError> {
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };
        let raw = self.post("embeddings", &body).await?;
        let vector = parse_embedding(&raw)?;
        debug!(
            "embedding generated (model={}, dims={})",
            self.embedding_model,
            vector.len()
        );
        Ok(vector)
    }
}

#[async_trait]
impl CompletionProvider for OpenAI {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LLMError> {
        let body = CompletionBody {
            model: &self.completion_model,
            prompt: &request.prompt,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            stop: &request.stop,
        };
        let raw = self.post("completions", &body).await?;
        let text = parse_completion(&raw)?;
        debug!(
            "completion generated (model={}, prompt_len={}, text_len={})",
            self.completion_model,
            request.prompt.len(),
            text.len()
        );
        Ok(text)
    }
}

impl LLMProvider for OpenAI {
    fn name(&self) -> &str {
        "OpenAI"
    }
}

fn api_error(status: u16, body: &str) -> LLMError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.to_string());
    LLMError::Api { status, message }
}

fn parse_embedding(body: &str) -> Result<Vec<f64>, LLMError> {
    let parsed: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|err| LLMError::InvalidResponse(format!("embedding body: {err}")))?;
    parsed
        .data
        .into_iter()
        .next()
        .map(|data| data.embedding)
        .ok_or_else(|| LLMError::InvalidResponse("no embedding returned".to_string()))
}

fn parse_completion(body: &str) -> Result<String, LLMError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|err| LLMError::InvalidResponse(format!("completion body: {err}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or_else(|| LLMError::InvalidResponse("no completion choice returned".to_string()))
}
