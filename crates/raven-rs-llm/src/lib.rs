//! Model-call plumbing for Raven: provider traits, the OpenAI-compatible HTTP
//! backend, text sanitization, and bounded retry.

pub mod error;
pub mod openai;
pub mod provider;
pub mod retry;
pub mod text;

pub use error::LLMError;
pub use openai::OpenAI;
pub use provider::{CompletionProvider, CompletionRequest, EmbeddingProvider, LLMProvider};
pub use retry::{RetryPolicy, retry_call};
pub use text::{normalize_completion, sanitize_ascii};
