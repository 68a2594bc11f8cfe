#[cfg(test)]
mod tests {
    use crate::utils::retry::*;
    use anyhow::{Context, anyhow};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[test]
    fn test_classify_typed_rate_limit_error() {
        let err = anyhow::Error::new(RateLimitError::new(
            "quota exceeded",
            Some(Duration::from_secs(3)),
        ));
        assert_eq!(
            classify(&err),
            RetryClass::RateLimited {
                retry_after: Some(Duration::from_secs(3))
            }
        );
    }

    #[test]
    fn test_classify_walks_context_chain() {
        let err = Err::<(), _>(RateLimitError::new("slow down", None))
            .context("calling generation service")
            .context("section 5.3.1 worker")
            .unwrap_err();
        assert_eq!(classify(&err), RetryClass::RateLimited { retry_after: None });
    }

    #[test]
    fn test_classify_text_markers_with_wait_hint() {
        let err = anyhow!("Error 429: Rate limit reached. Please try again in 2.5 seconds.");
        assert_eq!(
            classify(&err),
            RetryClass::RateLimited {
                retry_after: Some(Duration::from_secs_f64(3.5))
            }
        );

        let err = anyhow!("provider said: rate_limit_exceeded");
        assert_eq!(classify(&err), RetryClass::RateLimited { retry_after: None });
    }

    #[test]
    fn test_classify_other_errors_are_fatal() {
        assert_eq!(classify(&anyhow!("invalid api key")), RetryClass::Fatal);
        assert_eq!(
            classify(&anyhow!("context length exceeded after 30 seconds")),
            RetryClass::Fatal
        );
    }

    #[test]
    fn test_delay_uses_max_of_hint_and_backoff() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        assert_eq!(policy.delay_for(0, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3, None), Duration::from_secs(16));
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(10))),
            Duration::from_secs(10)
        );
        assert_eq!(
            policy.delay_for(3, Some(Duration::from_secs(10))),
            Duration::from_secs(16)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_rate_limits() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(5, Duration::from_secs(2));

        let counter = calls.clone();
        let result = retry_with_backoff(&policy, "test", || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(anyhow!("HTTP 429 Too Many Requests"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        let counter = calls.clone();
        let result: anyhow::Result<()> = retry_with_backoff(&policy, "test", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("rate limit"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(5, Duration::from_millis(1));

        let counter = calls.clone();
        let result: anyhow::Result<()> = retry_with_backoff(&policy, "test", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("bad request"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
