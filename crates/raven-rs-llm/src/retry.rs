//! Bounded retry with a fixed pause between attempts.

use crate::error::LLMError;
use log::{error, warn};
use std::future::Future;
use std::time::Duration;

/// How often and how patiently a model call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Pause after each failed attempt except the last.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }
}

/// Run `call` until it succeeds or the attempt cap is reached.
///
/// On exhaustion the last error is wrapped in [`LLMError::RetryExhausted`].
pub async fn retry_call<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut call: F,
) -> Result<T, LLMError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LLMError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                error!("{label} call failed, giving up (attempts={attempt}, error={err})");
                return Err(LLMError::RetryExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            Err(err) => {
                warn!(
                    "{label} call failed, retrying (attempt={attempt}, max_attempts={max_attempts}, error={err})"
                );
                if !policy.backoff.is_zero() {
                    tokio::time::sleep(policy.backoff).await;
                }
            }
        }
    }
}
