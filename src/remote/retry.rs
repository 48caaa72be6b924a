use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::{TimelineError, TimelineResult};

/// Bounded exponential backoff applied to rate-limited reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(SyncConfig::default())
    }
}

impl From<SyncConfig> for RetryPolicy {
    fn from(config: SyncConfig) -> Self {
        Self {
            max_attempts: config.max_read_attempts.max(1),
            backoff_base: config.backoff_base(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after zero-based `attempt` failed: `base * 2^attempt`.
    #[must_use]
    pub fn backoff_for(self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2_u32.saturating_pow(attempt))
    }
}

/// Runs `op` until it succeeds, retrying only rate-limit errors.
///
/// Any other error propagates on the attempt it occurred. When every attempt
/// is rate limited the last error is returned with the attempt count filled in.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> TimelineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TimelineResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(TimelineError::RateLimited { message, .. }) => {
                if attempt + 1 >= max_attempts {
                    warn!(label, attempts = attempt + 1, "rate limit retries exhausted");
                    return Err(TimelineError::RateLimited {
                        attempts: attempt + 1,
                        message,
                    });
                }
                let delay = policy.backoff_for(attempt);
                debug!(
                    label,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
