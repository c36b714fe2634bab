//! Errors returned by model providers.

use thiserror::Error;

/// Failure of an embedding or completion call.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Provider-specific failure.
    #[error("provider error: {0}")]
    ProviderError(String),
    /// Every attempt of a retried call failed.
    #[error("{last} (after {attempts} attempts)")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<LLMError>,
    },
}
