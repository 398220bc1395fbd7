//! Retry on upstream rate limits, sleeping for the delay the upstream advises.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bon::Builder;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::interpreter::{self, render, ApiError};

/// Attempts made when no policy is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Added on top of the advised delay so the retry lands after the window resets.
pub const DEFAULT_GRACE: Duration = Duration::from_millis(100);

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). Zero is treated as one.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    /// Extra sleep added to the upstream's retry-after.
    #[builder(default = DEFAULT_GRACE)]
    pub grace: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            grace: DEFAULT_GRACE,
        }
    }
}

/// Why [`RetryPolicy::execute`] gave up.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// The last attempt's error, passed through unchanged.
    #[error("{0}")]
    Upstream(E),

    /// The caller's cancellation token fired.
    #[error("retry cancelled (last error: {})", render(.last_error.as_ref()))]
    Cancelled { last_error: Option<ApiError> },
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The upstream error, if the driver did not stop because of cancellation.
    pub fn into_upstream(self) -> Option<E> {
        match self {
            Self::Upstream(err) => Some(err),
            Self::Cancelled { .. } => None,
        }
    }
}

impl RetryPolicy {
    /// Execute an async operation, retrying advised rate limits.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.execute_with_cancel(operation, &CancellationToken::new())
            .await
    }

    /// Execute an async operation, retrying advised rate limits until `cancel` fires.
    ///
    /// A failure is retried only when its text parses as an upstream error
    /// carrying a 429 status, the `rate_limit_exceeded` code and a rate-limit
    /// descriptor. The driver then sleeps for the advised delay plus
    /// [`grace`](Self::grace). Every other failure is returned as is.
    pub async fn execute_with_cancel<F, Fut, T, E>(
        &self,
        mut operation: F,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error: Option<ApiError> = None;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled { last_error }),
                outcome = operation() => outcome,
            };
            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let api_error = match interpreter::parse(&err.to_string()) {
                Ok(api_error) => api_error,
                Err(parse_err) => {
                    tracing::debug!(attempt, error = %parse_err, "Upstream error not recognized");
                    return Err(RetryError::Upstream(err));
                }
            };
            let Some(retry_after) = api_error.retry_after().filter(|_| api_error.is_retry_advised())
            else {
                tracing::debug!(
                    attempt,
                    category = %api_error.category(),
                    "Upstream error is not retryable"
                );
                return Err(RetryError::Upstream(err));
            };
            if attempt >= max_attempts {
                tracing::warn!(max_attempts, error = %api_error, "Rate limited on final attempt");
                return Err(RetryError::Upstream(err));
            }

            let delay = retry_after + self.grace;
            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %api_error,
                "Rate limited, retrying after advised delay"
            );
            last_error = Some(api_error);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled { last_error }),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
