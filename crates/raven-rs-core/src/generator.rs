//! Model-call wrapper: sanitization, retries, normalization, audit.

use crate::audit::CompletionAuditLog;
use log::{debug, warn};
use raven_rs_config::{GenerationConfig, RavenConfig};
use raven_rs_llm::{
    CompletionRequest, LLMError, LLMProvider, RetryPolicy, normalize_completion, retry_call,
    sanitize_ascii,
};
use std::sync::Arc;

/// Every model call of a turn goes through here.
///
/// Inputs are reduced to ASCII before they leave the process. Completion
/// failures that outlive the retry policy become a `"<service> error: <details>"`
/// placeholder instead of an error.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn LLMProvider>,
    retry: RetryPolicy,
    generation: GenerationConfig,
    audit: Option<CompletionAuditLog>,
}

impl Generator {
    /// Default retry policy and sampling parameters, no audit log.
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            generation: GenerationConfig::default(),
            audit: None,
        }
    }

    /// Build from the `retry`, `generation`, and `audit` sections of a config.
    ///
    /// Speaker tags derived from `user_name` and `agent_name` are added to the
    /// stop list when missing. An unchanged default stop list is replaced by
    /// those tags.
    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &RavenConfig) -> Self {
        let mut generation = config.generation.clone();
        if generation.stop == GenerationConfig::default().stop {
            generation.stop.clear();
        }
        for name in [&config.user_name, &config.agent_name] {
            let tag = format!("{name}:");
            if !generation.stop.contains(&tag) {
                generation.stop.push(tag);
            }
        }
        let audit = config
            .audit
            .enabled
            .then(|| CompletionAuditLog::new(&config.audit.path));
        Self {
            provider,
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts,
                backoff: config.retry.backoff(),
            },
            generation,
            audit,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_audit(mut self, audit: CompletionAuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    /// Service label used in placeholders.
    pub fn service_name(&self) -> &str {
        self.provider.name()
    }

    /// Embed `text` with retries. The caller decides how to degrade on error.
    pub async fn embed(&self, text: &str) -> Result<Vec<f64>, LLMError> {
        let text = sanitize_ascii(text);
        let provider = &self.provider;
        let input = text.as_str();
        retry_call(self.retry, "embedding", move || provider.embed(input)).await
    }

    /// Complete `prompt` with retries. Never fails: exhaustion yields a placeholder.
    pub async fn complete(&self, prompt: &str) -> String {
        let request = self.request(prompt);
        let provider = &self.provider;
        let request_ref = &request;
        match retry_call(self.retry, "completion", move || {
            provider.complete(request_ref)
        })
        .await
        {
            Ok(raw) => {
                let text = normalize_completion(&raw);
                if let Some(audit) = &self.audit
                    && let Err(err) = audit.record(&request.prompt, &text)
                {
                    warn!("failed to write completion audit (error={err})");
                }
                text
            }
            Err(err) => self.placeholder(&err),
        }
    }

    /// Render a model-call failure as reply text.
    pub fn placeholder(&self, err: &LLMError) -> String {
        let text = format!("{} error: {err}", self.provider.name());
        debug!("model call replaced by placeholder (text={text})");
        text
    }

    fn request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            prompt: sanitize_ascii(prompt),
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
            top_p: self.generation.top_p,
            frequency_penalty: self.generation.frequency_penalty,
            presence_penalty: self.generation.presence_penalty,
            stop: self.generation.stop.clone(),
        }
    }
}
