//! Node-to-node HTTP helpers.
//!
//! Every inter-node call goes through these helpers so retry behaviour is uniform: connection
//! and timeout errors are retried with jittered exponential backoff (150ms doubling, capped at
//! 1.2s); any HTTP response, successful or not, is returned to the caller as-is.

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: usize = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

pub async fn post_with_retry<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    payload: &T,
    timeout: Duration,
    attempts: usize,
) -> Result<reqwest::Response> {
    send_with_retry(
        || client.post(url).json(payload).timeout(timeout),
        attempts,
    )
    .await
}

pub async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    attempts: usize,
) -> Result<reqwest::Response> {
    send_with_retry(|| client.get(url).timeout(timeout), attempts).await
}

async fn send_with_retry<F>(build: F, attempts: usize) -> Result<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut delay_ms = 150u64;

    for attempt in 0..attempts {
        match build().send().await {
            Ok(resp) => return Ok(resp),
            Err(e) => {
                if attempt + 1 == attempts {
                    return Err(anyhow::anyhow!(e));
                }
                tracing::debug!("Request attempt {} failed: {}", attempt + 1, e);
                let jitter = rand::random::<u64>() % 50;
                tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                delay_ms = (delay_ms * 2).min(1200);
            }
        }
    }

    Err(anyhow::anyhow!("Retry attempts exhausted"))
}
