use crate::config::RetryConfig;
use crate::error::ResolveError;
use crate::types::Chain;
use std::future::Future;

/// Run an upstream call, retrying connectivity failures with exponential backoff.
///
/// Non-retryable errors (not found, revert, bad data) are returned on the
/// first occurrence. After `config.max_retries` extra attempts the last
/// connectivity error is returned.
///
/// # Arguments
/// * `chain` - Upstream being called (for logging)
/// * `method` - JSON-RPC method name (for logging)
/// * `config` - Retry configuration
/// * `call` - Async function performing a single bounded attempt
pub async fn call_with_retry<T, F, Fut>(
    chain: Chain,
    method: &str,
    config: &RetryConfig,
    call: F,
) -> Result<T, ResolveError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ResolveError>>,
{
    let mut attempt = 0;

    loop {
        match call().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(
                        chain = %chain,
                        method = method,
                        attempts = attempt + 1,
                        "Upstream call recovered"
                    );
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;

                let backoff = config.jittered_backoff(attempt - 1);
                tracing::warn!(
                    chain = %chain,
                    method = method,
                    attempt = attempt,
                    max_retries = config.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Upstream call failed, retrying"
                );

                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_call_with_retry_success_first_try() {
        let result = call_with_retry(Chain::L1, "eth_blockNumber", &fast_config(3), || async {
            Ok::<_, ResolveError>(42u64)
        })
        .await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_call_with_retry_success_after_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = call_with_retry(Chain::L2, "eth_blockNumber", &fast_config(5), || {
            let attempts = attempts_clone.clone();
            async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(ResolveError::connectivity(Chain::L2, "not yet"))
                } else {
                    Ok(7u64)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_call_with_retry_gives_up() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = call_with_retry(Chain::L1, "eth_call", &fast_config(2), || {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ResolveError::connectivity(Chain::L1, "always fails"))
            }
        })
        .await;

        assert!(matches!(result, Err(ResolveError::Connectivity { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_call_with_retry_does_not_retry_not_found() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = call_with_retry(Chain::L2, "eth_getTransactionReceipt", &fast_config(5), || {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ResolveError::NotFound("0xabc".into()))
            }
        })
        .await;

        assert_eq!(result, Err(ResolveError::NotFound("0xabc".into())));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
