//! Bounded retry and polling against state that changes outside this process.
//!
//! Automation calls into a busy IDE fail intermittently, so every lookup that
//! depends on it goes through [`with_retry`]. Waits for the IDE or the
//! filesystem to reach some state go through [`poll_until`].

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// The error of the last attempt is returned unchanged. Operator
/// cancellation is returned immediately without further attempts.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(what, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_cancellation() => return Err(e),
            Err(e) if attempt >= attempts => {
                tracing::warn!(what, attempts, error = %e, "Retries exhausted");
                return Err(e);
            }
            Err(e) => {
                tracing::debug!(what, attempt, error = %e, "Attempt failed, retrying");
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
        }
    }
}

/// Fetch a value every `interval` until `is_ready` accepts it.
///
/// `max_polls` of `None` waits forever. Errors from `fetch` end the wait.
pub async fn poll_until<T, F, Fut, P>(
    what: &str,
    interval: Duration,
    max_polls: Option<u32>,
    mut fetch: F,
    mut is_ready: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: FnMut(&T) -> bool,
{
    let mut polls = 0u32;

    loop {
        let value = fetch().await?;
        polls += 1;

        if is_ready(&value) {
            return Ok(value);
        }

        if let Some(max) = max_polls {
            if polls >= max {
                tracing::warn!(what, polls, "Polling limit reached");
                return Err(AppError::PollExhausted {
                    what: what.to_string(),
                    polls,
                });
            }
        }

        tokio::time::sleep(interval).await;
    }
}
