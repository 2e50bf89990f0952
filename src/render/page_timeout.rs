//! Timeout utilities for browser operations
//!
//! Provides async timeout wrappers to prevent indefinite hangs during
//! page navigation, settling and DOM capture.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Wrap an async browser operation with an explicit timeout
///
/// Returns proper error messages distinguishing between timeout and operation failures.
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout_secs` - Timeout duration in seconds
/// * `operation_name` - Human-readable name for error messages
pub async fn with_page_timeout<F, T>(operation: F, timeout_secs: u64, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {timeout_secs} seconds"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_results() {
        let value = with_page_timeout(async { Ok(5) }, 1, "noop").await.unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn reports_the_operation_on_timeout() {
        let err = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            },
            1,
            "navigation",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "navigation timeout after 1 seconds");
    }
}
