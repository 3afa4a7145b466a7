use futures_util::stream::{self, StreamExt};
use std::time::Duration;

use super::{FetchError, ModelSource};
use crate::config::DownloadConfig;
use crate::model::ModelRecord;

/// Bounded retry with exponential backoff for rate-limited fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_retries: u32,
    /// Wait before the first retry; doubled after each one.
    pub initial_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_wait: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_wait: Duration) -> Self {
        Self {
            max_retries,
            initial_wait,
        }
    }

    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_secs(config.initial_wait_secs),
        )
    }
}

/// Wait before the `retry`-th retry (1-based): `initial * 2^(retry - 1)`.
/// Growth is uncapped apart from saturating at `Duration::MAX`.
pub fn backoff_delay(initial: Duration, retry: u32) -> Duration {
    if initial.is_zero() {
        return Duration::ZERO;
    }
    let Some(factor) = 1u64.checked_shl(retry.saturating_sub(1)) else {
        return Duration::MAX;
    };

    let nanos = initial.as_nanos().saturating_mul(u128::from(factor));
    match u64::try_from(nanos / 1_000_000_000) {
        Ok(secs) => Duration::new(secs, (nanos % 1_000_000_000) as u32),
        Err(_) => Duration::MAX,
    }
}

/// Fetch one model, retrying only on rate limiting.
///
/// Returns `None` when the retries run out or on any other failure; the
/// caller skips that model and carries on with the batch.
pub async fn fetch_with_retry<S>(
    source: &S,
    id: &str,
    policy: &RetryPolicy,
) -> Option<ModelRecord>
where
    S: ModelSource + ?Sized,
{
    for attempt in 1..=policy.max_retries {
        match source.fetch_model(id).await {
            Ok(model) => {
                if attempt > 1 {
                    log::debug!("Fetched {} on attempt {}", id, attempt);
                }
                return Some(model);
            }
            Err(FetchError::RateLimited) => {
                if attempt == policy.max_retries {
                    break;
                }
                let wait = backoff_delay(policy.initial_wait, attempt);
                log::info!(
                    "Rate limited on {} (attempt {}/{}), waiting {}s before retrying",
                    id,
                    attempt,
                    policy.max_retries,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                log::error!("✗ {}: {}", id, e);
                return None;
            }
        }
    }

    log::warn!(
        "Giving up on {} after {} rate-limited attempts",
        id,
        policy.max_retries
    );
    None
}

/// Outcome counts for a batch download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub requested: usize,
    pub fetched: usize,
    pub skipped: usize,
}

/// Fetch every id with at most `concurrency` requests in flight.
///
/// Results keep the order of `ids`; skipped models are simply absent. Only
/// returns once every fetch has finished, so the caller can write the
/// aggregate file in one go.
pub async fn fetch_all<S>(
    source: &S,
    ids: &[String],
    policy: &RetryPolicy,
    concurrency: usize,
) -> (Vec<ModelRecord>, DownloadSummary)
where
    S: ModelSource + ?Sized,
{
    let total = ids.len();

    let results: Vec<Option<ModelRecord>> = stream::iter(ids.iter().enumerate())
        .map(|(idx, id)| async move {
            log::info!("[{}/{}] Fetching: {}", idx + 1, total, id);
            fetch_with_retry(source, id, policy).await
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let models: Vec<ModelRecord> = results.into_iter().flatten().collect();
    let summary = DownloadSummary {
        requested: total,
        fetched: models.len(),
        skipped: total - models.len(),
    };
    (models, summary)
}
