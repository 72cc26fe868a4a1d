use std::{future::Future, pin::Pin, time::Duration};

use tokio::time::sleep;
use tracing;

/// Errors that may succeed if the same operation is attempted again.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `max_retries` extra attempts have been made, doubling the delay each time.
pub async fn retry_with_backoff<'a, F, T, E>(
    mut operation: F,
    max_retries: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> BoxFuture<'a, Result<T, E>>,
    E: std::fmt::Display + Retryable,
{
    let mut delay = initial_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                tracing::warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempt + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
