//! Configuration schema for Raven.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root config for the Raven agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RavenConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    /// Persona name used in prompt text and as a stop token.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    /// Name the persona uses for its interlocutor.
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for RavenConfig {
    fn default() -> Self {
        Self {
            schema: None,
            agent_name: default_agent_name(),
            user_name: default_user_name(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            retry: RetryConfig::default(),
            memory: MemoryConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl RavenConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> RavenConfigBuilder {
        RavenConfigBuilder::new()
    }
}

fn default_agent_name() -> String {
    "RAVEN".to_string()
}

fn default_user_name() -> String {
    "USER".to_string()
}

/// Builder for assembling a `RavenConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct RavenConfigBuilder {
    config: RavenConfig,
}

impl RavenConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: RavenConfig::default(),
        }
    }

    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.config.agent_name = name.into();
        self
    }

    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.config.user_name = name.into();
        self
    }

    /// Replace the model backend configuration.
    pub fn llm(mut self, llm: LlmConfig) -> Self {
        self.config.llm = llm;
        self
    }

    /// Replace the completion parameters.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Replace the memory store configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    pub fn audit(mut self, audit: AuditConfig) -> Self {
        self.config.audit = audit;
        self
    }

    /// Finalize and return the built `RavenConfig`.
    pub fn build(self) -> RavenConfig {
        self.config
    }
}

/// Model backend: endpoint, credentials, and model names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Inline key; takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_completion_model")]
    pub completion_model: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            embedding_model: default_embedding_model(),
            completion_model: default_completion_model(),
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from config, falling back to the configured env var.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Resolve the API key using a custom environment lookup.
    pub fn resolve_api_key_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        if let Some(key) = self.api_key.as_deref().map(str::trim)
            && !key.is_empty()
        {
            return Ok(key.to_string());
        }
        match lookup(&self.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ConfigError::MissingApiKey {
                env: self.api_key_env.clone(),
            }),
        }
    }

    /// Request timeout, when configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_completion_model() -> String {
    "text-davinci-003".to_string()
}

/// Sampling parameters sent with every completion call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub frequency_penalty: f32,
    #[serde(default)]
    pub presence_penalty: f32,
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: default_stop(),
        }
    }
}

fn default_top_p() -> f32 {
    1.0
}

fn default_max_tokens() -> u32 {
    400
}

fn default_stop() -> Vec<String> {
    vec!["USER:".to_string(), "RAVEN:".to_string()]
}

/// Retry policy for model calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    1000
}

/// Memory log location and recall sizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,
    /// Records recalled by similarity per turn.
    #[serde(default = "default_recall_k")]
    pub recall_k: usize,
    /// Trailing records included verbatim in the prompt.
    #[serde(default = "default_recent_messages")]
    pub recent_messages: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: default_memory_path(),
            recall_k: default_recall_k(),
            recent_messages: default_recent_messages(),
        }
    }
}

fn default_memory_path() -> PathBuf {
    PathBuf::from("chat_logs")
}

fn default_recall_k() -> usize {
    10
}

fn default_recent_messages() -> usize {
    4
}

/// Per-call completion audit files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditConfig {
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: default_audit_path(),
        }
    }
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("gpt3_logs")
}
