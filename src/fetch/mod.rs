//! Remote model fetching: the `ModelSource` seam, the Minerva HTTP client,
//! and the rate-limit retry policy wrapped around it.

mod minerva;
mod retry;

pub use minerva::MinervaClient;
pub use retry::{backoff_delay, fetch_all, fetch_with_retry, DownloadSummary, RetryPolicy};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::ModelRecord;

/// Why a single model fetch failed. Only `RateLimited` is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// HTTP 429 from the model service
    #[error("rate limited by model service")]
    RateLimited,

    /// HTTP 404 for the requested id
    #[error("model not found: {0}")]
    NotFound(String),

    /// Transport, decode, or any other status
    #[error("{0}")]
    Other(String),
}

/// Anything that can list and fetch GO-CAM models by identifier.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Every model identifier the service exposes.
    async fn model_ids(&self) -> std::result::Result<Vec<String>, FetchError>;

    /// Fetch one model record.
    async fn fetch_model(&self, id: &str) -> std::result::Result<ModelRecord, FetchError>;
}
