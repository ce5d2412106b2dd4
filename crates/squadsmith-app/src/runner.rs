// Runs synchronous engine work off the async runtime with a deadline.

use anyhow::Context;
use std::time::Duration;
use tracing::error;

/// Run `work` on the blocking pool, giving up after `limit`.
///
/// On timeout the blocking thread is left to finish on its own; its result
/// is dropped.
pub async fn run_blocking<T, F>(limit: Duration, work: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(limit, handle).await {
        Ok(joined) => joined.context("blocking task panicked"),
        Err(_) => {
            error!("blocking task timed out after {:?}", limit);
            anyhow::bail!("did not finish within {:?}", limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_the_result() {
        let value = run_blocking(Duration::from_secs(5), || 6 * 7).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn times_out_slow_work() {
        let result = run_blocking(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_millis(300));
        })
        .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }

    #[tokio::test]
    async fn reports_panics() {
        let result: anyhow::Result<()> =
            run_blocking(Duration::from_secs(5), || panic!("boom")).await;
        assert!(result.is_err());
    }
}
