use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{FetchError, ModelSource};
use crate::config::MinervaConfig;
use crate::error::Result;
use crate::model::ModelRecord;

const MODEL_IRI_PREFIX: &str = "http://model.geneontology.org/";
const MODEL_CURIE_PREFIX: &str = "gomodel:";

/// One entry of the model index. The service has returned both bare ids
/// and objects keyed by `gocam` and/or `id`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModelIdEntry {
    Plain(String),
    Keyed {
        #[serde(default)]
        gocam: Option<String>,
        #[serde(default)]
        id: Option<String>,
    },
}

impl ModelIdEntry {
    /// The entry's id as a `gomodel:` CURIE; `gocam` wins over `id`.
    fn into_curie(self) -> Option<String> {
        let raw = match self {
            ModelIdEntry::Plain(id) => id,
            ModelIdEntry::Keyed { gocam, id } => gocam.or(id)?,
        };
        if raw.trim().is_empty() {
            return None;
        }
        Some(match raw.strip_prefix(MODEL_IRI_PREFIX) {
            Some(local) => format!("{}{}", MODEL_CURIE_PREFIX, local),
            None => raw,
        })
    }
}

/// HTTP client for the GO-CAM model service.
pub struct MinervaClient {
    client: Client,
    ids_url: String,
    model_url: String,
}

impl MinervaClient {
    /// Create a client from the `[minerva]` config section.
    pub fn new(config: &MinervaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            ids_url: config.ids_url.clone(),
            model_url: config.model_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of a single model. The service keys models by local id, so a
    /// `gomodel:` prefix is dropped.
    fn model_endpoint(&self, id: &str) -> String {
        let local = id.strip_prefix(MODEL_CURIE_PREFIX).unwrap_or(id);
        format!("{}/{}", self.model_url, local)
    }

    async fn get(&self, url: &str, id: &str) -> std::result::Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Other(format!("Network error: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(classify_status(status, id, &body))
    }
}

/// Check a decoded record at the fetch boundary: it must carry an id, and
/// null fields are dropped.
fn accept_record(
    id: &str,
    mut model: ModelRecord,
) -> std::result::Result<ModelRecord, FetchError> {
    if model.id().is_none() {
        return Err(FetchError::Other(format!("record for {} has no id", id)));
    }
    model.elide_empty();
    Ok(model)
}

/// Map a non-success HTTP status onto the fetch error kinds.
fn classify_status(status: StatusCode, id: &str, body: &str) -> FetchError {
    match status.as_u16() {
        429 => FetchError::RateLimited,
        404 => FetchError::NotFound(id.to_string()),
        _ => FetchError::Other(format!("Model service error {}: {}", status, body.trim())),
    }
}

#[async_trait]
impl ModelSource for MinervaClient {
    async fn model_ids(&self) -> std::result::Result<Vec<String>, FetchError> {
        let response = self.get(&self.ids_url, "<model index>").await?;
        let entries: Vec<ModelIdEntry> = response
            .json()
            .await
            .map_err(|e| FetchError::Other(format!("Failed to parse model index: {}", e)))?;

        let total = entries.len();
        let ids: Vec<String> = entries.into_iter().filter_map(ModelIdEntry::into_curie).collect();
        if ids.len() < total {
            log::warn!("Ignored {} model index entries without an id", total - ids.len());
        }
        Ok(ids)
    }

    async fn fetch_model(&self, id: &str) -> std::result::Result<ModelRecord, FetchError> {
        if id.trim().is_empty() {
            return Err(FetchError::Other("empty model id".to_string()));
        }

        let url = self.model_endpoint(id);
        log::debug!("GET {}", url);

        let response = self.get(&url, id).await?;
        let model: ModelRecord = response
            .json()
            .await
            .map_err(|e| FetchError::Other(format!("Failed to parse model {}: {}", id, e)))?;

        accept_record(id, model)
    }
}
