//! Exponential backoff with full jitter, non-blocking via `tokio::time::sleep`.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl RetryPolicy {
    /// Source fetch retries: quick, tight bound — upstream providers are
    /// expected to recover fast or not at all within a request's lifetime.
    pub fn source() -> Self {
        Self {
            max_attempts: 3,
            min_wait: Duration::from_millis(100),
            max_wait: Duration::from_secs(10),
        }
    }

    /// Publish retries: looser bound, since the ledger write already
    /// succeeded and we're only racing to deliver on the hot path.
    pub fn publish() -> Self {
        Self {
            max_attempts: 3,
            min_wait: Duration::from_millis(500),
            max_wait: Duration::from_secs(30),
        }
    }

    /// Full-jitter backoff for `attempt` (0-indexed): a random duration in
    /// `[min_wait, min(max_wait, min_wait * 2^attempt)]`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = self.min_wait.as_millis() as u64 * 2u64.saturating_pow(attempt);
        let cap = exp.min(self.max_wait.as_millis() as u64).max(self.min_wait.as_millis() as u64);
        let low = self.min_wait.as_millis() as u64;
        let jittered = if cap > low {
            rand::thread_rng().gen_range(low..=cap)
        } else {
            low
        };
        Duration::from_millis(jittered)
    }
}

/// Runs `f` up to `policy.max_attempts` times, sleeping with full-jitter
/// backoff between attempts. Returns the last error if every attempt fails.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: RetryPolicy, mut f: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match f(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(err);
                }
                tokio::time::sleep(policy.backoff_for(attempt - 1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_stays_within_bounds() {
        let policy = RetryPolicy::source();
        for attempt in 0..10 {
            let wait = policy.backoff_for(attempt);
            assert!(wait >= policy.min_wait);
            assert!(wait <= policy.max_wait);
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let policy = RetryPolicy {
            max_attempts: 5,
            min_wait: Duration::from_millis(1),
            max_wait: Duration::from_millis(5),
        };
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let result: Result<&str, &str> = retry_with_backoff(policy, |_| {
            let count = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err("not yet")
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            min_wait: Duration::from_millis(1),
            max_wait: Duration::from_millis(2),
        };
        let result: Result<&str, &str> =
            retry_with_backoff(policy, |_| async { Err("always fails") }).await;
        assert_eq!(result, Err("always fails"));
    }
}
