//! Upstream subcategory fetching.
//!
//! One fetch is one GET against the upstream item-detail endpoint. The
//! fetcher never raises past its boundary: every network error, timeout,
//! non-success status, or malformed payload classifies as
//! `FetchOutcome::Failed`. The trait seam exists so the worker and the
//! coordinator can be exercised without a live upstream.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;

/// Item type the proxy resolves categories for.
const ITEM_TYPE: &str = "Mod";

/// Fields requested from the upstream detail endpoint. Element 0 of the
/// response is the category name, element 1 the category id.
const ITEM_FIELDS: &str = "Category().name,catid";

/// Classified outcome of one upstream lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Resolved { name: String, category_id: Value },
    Failed,
}

/// Seam over the single upstream lookup.
#[async_trait]
pub trait SubcategoryFetcher: Send + Sync {
    /// Perform one lookup with a bounded timeout, classifying the result.
    async fn fetch(&self, item_id: u64, timeout: Duration) -> FetchOutcome;
}

/// Production fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
    upstream_url: String,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, upstream_url: impl Into<String>) -> Self {
        Self {
            client,
            upstream_url: upstream_url.into(),
        }
    }

    /// Build the upstream request URL. The fields parameter contains
    /// characters the upstream expects literally, so the query string is
    /// assembled by hand rather than percent-encoded.
    fn request_url(&self, item_id: u64) -> String {
        format!(
            "{}?itemtype={}&itemid={}&fields={}",
            self.upstream_url, ITEM_TYPE, item_id, ITEM_FIELDS
        )
    }

    async fn try_fetch(
        &self,
        item_id: u64,
        timeout: Duration,
    ) -> Result<(String, Value), UpstreamError> {
        let response = self
            .client
            .get(self.request_url(item_id))
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        let payload: Value = response.json().await?;
        classify_payload(&payload).ok_or_else(|| UpstreamError::Format {
            reason: "expected an array with name and category id".to_string(),
        })
    }
}

#[async_trait]
impl SubcategoryFetcher for HttpFetcher {
    async fn fetch(&self, item_id: u64, timeout: Duration) -> FetchOutcome {
        match self.try_fetch(item_id, timeout).await {
            Ok((name, category_id)) => {
                tracing::info!(item_id, category = %name, "Subcategory resolved");
                FetchOutcome::Resolved { name, category_id }
            }
            Err(e) => {
                tracing::warn!(item_id, error = %e, "Subcategory fetch failed");
                FetchOutcome::Failed
            }
        }
    }
}

/// Extract (name, category id) from a well-formed upstream payload.
///
/// Well-formed means: a JSON array of at least two elements whose first
/// element is a string. Anything else is malformed and yields `None`.
pub fn classify_payload(payload: &Value) -> Option<(String, Value)> {
    let elements = payload.as_array()?;
    if elements.len() < 2 {
        return None;
    }
    let name = elements[0].as_str()?.to_string();
    Some((name, elements[1].clone()))
}
