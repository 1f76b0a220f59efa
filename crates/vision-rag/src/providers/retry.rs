//! Retry with exponential backoff for model service requests

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Delay before retry number `attempt` (0-based): 1s, 2s, 4s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Run `operation` up to `max_retries + 1` times, sleeping between failures
pub async fn retry_request<F, Fut, T>(service: &str, max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt < max_retries {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "{} request failed (attempt {}/{}): {}; retrying in {:?}",
                        service,
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::internal(format!("{} request never ran", service))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_request("test", 2, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::llm("unavailable"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_request("test", 1, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::llm("still down"))
        })
        .await;

        assert!(matches!(result, Err(Error::Llm(ref m)) if m == "still down"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
