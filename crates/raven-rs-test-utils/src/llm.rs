use async_trait::async_trait;
use parking_lot::Mutex;
use raven_rs_llm::{
    CompletionProvider, CompletionRequest, EmbeddingProvider, LLMError, LLMProvider,
};
use std::sync::Arc;

const DEFAULT_DIMS: usize = 16;

/// Deterministic bag-of-words embedding.
///
/// Each lowercase alphanumeric word adds 1.0 to a bucket chosen by an FNV-1a
/// hash, so texts sharing words point in similar directions. Text without
/// words maps to the zero vector.
pub fn hash_embedding(text: &str, dims: usize) -> Vec<f64> {
    let mut vector = vec![0.0; dims.max(1)];
    let len = vector.len() as u64;
    for word in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.to_ascii_lowercase().bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        vector[(hash % len) as usize] += 1.0;
    }
    vector
}

/// Backend that embeds with [`hash_embedding`] and always completes with the
/// same text. Every completion request is recorded.
#[derive(Debug, Clone)]
pub struct FixedLLM {
    completion: String,
    dims: usize,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    embedded: Arc<Mutex<Vec<String>>>,
}

impl FixedLLM {
    pub fn new(completion: impl Into<String>) -> Self {
        Self {
            completion: completion.into(),
            dims: DEFAULT_DIMS,
            requests: Arc::new(Mutex::new(Vec::new())),
            embedded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_dims(mut self, dims: usize) -> Self {
        self.dims = dims;
        self
    }

    /// Completion requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Prompts seen so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|request| request.prompt.clone())
            .collect()
    }

    /// Texts passed to `embed`, oldest first.
    pub fn embedded(&self) -> Vec<String> {
        self.embedded.lock().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for FixedLLM {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LLMError> {
        self.embedded.lock().push(text.to_string());
        Ok(hash_embedding(text, self.dims))
    }
}

#[async_trait]
impl CompletionProvider for FixedLLM {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LLMError> {
        self.requests.lock().push(request.clone());
        Ok(self.completion.clone())
    }
}

impl LLMProvider for FixedLLM {
    fn name(&self) -> &str {
        "Fake"
    }
}

/// Backend whose every call fails with the same provider error.
#[derive(Debug, Clone)]
pub struct FailingLLM {
    message: String,
    calls: Arc<Mutex<usize>>,
}

impl FailingLLM {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Total embed and complete calls attempted.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    fn fail(&self) -> LLMError {
        *self.calls.lock() += 1;
        LLMError::ProviderError(self.message.clone())
    }
}

#[async_trait]
impl EmbeddingProvider for FailingLLM {
    async fn embed(&self, _text: &str) -> Result<Vec<f64>, LLMError> {
        Err(self.fail())
    }
}

#[async_trait]
impl CompletionProvider for FailingLLM {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LLMError> {
        Err(self.fail())
    }
}

impl LLMProvider for FailingLLM {
    fn name(&self) -> &str {
        "Fake"
    }
}

#[derive(Debug, Default)]
struct FlakyState {
    embed_failures: usize,
    completion_failures: usize,
    embed_calls: usize,
    completion_calls: usize,
}

/// Wraps a [`FixedLLM`] and fails a scripted number of calls first.
///
/// Failure budgets count down across calls, so a budget of 5 with a 5-attempt
/// retry policy exhausts one logical call and lets the next one succeed.
#[derive(Debug, Clone)]
pub struct FlakyLLM {
    inner: FixedLLM,
    state: Arc<Mutex<FlakyState>>,
}

impl FlakyLLM {
    pub fn new(inner: FixedLLM) -> Self {
        Self {
            inner,
            state: Arc::new(Mutex::new(FlakyState::default())),
        }
    }

    /// Fail the next `count` embedding calls.
    pub fn fail_embeddings(self, count: usize) -> Self {
        self.state.lock().embed_failures = count;
        self
    }

    /// Fail the next `count` completion calls.
    pub fn fail_completions(self, count: usize) -> Self {
        self.state.lock().completion_failures = count;
        self
    }

    pub fn inner(&self) -> &FixedLLM {
        &self.inner
    }

    pub fn embed_calls(&self) -> usize {
        self.state.lock().embed_calls
    }

    pub fn completion_calls(&self) -> usize {
        self.state.lock().completion_calls
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyLLM {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LLMError> {
        {
            let mut state = self.state.lock();
            state.embed_calls += 1;
            if state.embed_failures > 0 {
                state.embed_failures -= 1;
                return Err(LLMError::ProviderError("embedding unavailable".to_string()));
            }
        }
        self.inner.embed(text).await
    }
}

#[async_trait]
impl CompletionProvider for FlakyLLM {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LLMError> {
        {
            let mut state = self.state.lock();
            state.completion_calls += 1;
            if state.completion_failures > 0 {
                state.completion_failures -= 1;
                return Err(LLMError::ProviderError(
                    "completion unavailable".to_string(),
                ));
            }
        }
        self.inner.complete(request).await
    }
}

impl LLMProvider for FlakyLLM {
    fn name(&self) -> &str {
        "Fake"
    }
}

#[cfg(test)]
mod tests {
    use super::{FlakyLLM, FixedLLM, hash_embedding};
    use pretty_assertions::assert_eq;
    use raven_rs_llm::{CompletionProvider, CompletionRequest, EmbeddingProvider};

    #[test]
    fn hash_embedding_is_deterministic_and_case_insensitive() {
        let a = hash_embedding("Hello world", 8);
        let b = hash_embedding("hello, WORLD!", 8);
        assert_eq!(a, b);
        assert_eq!(a.iter().sum::<f64>(), 2.0);
        assert_eq!(hash_embedding("  ", 8), vec![0.0; 8]);
    }

    #[tokio::test]
    async fn flaky_llm_fails_then_recovers() {
        let llm = FlakyLLM::new(FixedLLM::new("ok")).fail_completions(2);
        let request = CompletionRequest::new("p");
        assert!(llm.complete(&request).await.is_err());
        assert!(llm.complete(&request).await.is_err());
        assert_eq!(llm.complete(&request).await.expect("text"), "ok");
        assert_eq!(llm.completion_calls(), 3);
        assert_eq!(llm.inner().prompts(), vec!["p".to_string()]);
        assert!(llm.embed("x").await.is_ok());
    }
}
