//! Satellite imagery catalog collaborator.
//!
//! STAC Item Search client used to pick candidate scenes for a bounding
//! box and date window.

use std::env;

use async_trait::async_trait;
use reqwest::Client;

use crate::model::stac::{SceneItem, SceneItemCollection, SceneSearchBody};
use crate::model::GeoBox;

const STAC_BASE_URL_ENV: &str = "STAC_BASE_URL";
const DEFAULT_STAC_BASE_URL: &str = "https://planetarycomputer.microsoft.com/api/stac/v1";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Searches a scene catalog for imagery intersecting a box and interval.
///
/// Results come back in catalog relevance order; cloud cover of every
/// returned scene is strictly below `max_cloud_cover` percent.
#[async_trait]
pub trait SceneCatalog: Send + Sync {
    async fn search(
        &self,
        bbox: &GeoBox,
        interval: &str,
        collection: &str,
        max_cloud_cover: f64,
        limit: u32,
    ) -> Result<Vec<SceneItem>, CatalogError>;
}

/// Client for a STAC API `POST /search` endpoint.
pub struct StacClient {
    client: Client,
    base_url: String,
}

impl StacClient {
    /// Create a new STAC client.
    ///
    /// The base URL is resolved in this order:
    /// 1. `STAC_BASE_URL` environment variable if set
    /// 2. The Planetary Computer STAC API
    pub fn new() -> Self {
        let resolved_url = env::var(STAC_BASE_URL_ENV)
            .ok()
            .unwrap_or_else(|| DEFAULT_STAC_BASE_URL.to_string());

        Self {
            client: Client::new(),
            base_url: resolved_url,
        }
    }
}

impl Default for StacClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SceneCatalog for StacClient {
    async fn search(
        &self,
        bbox: &GeoBox,
        interval: &str,
        collection: &str,
        max_cloud_cover: f64,
        limit: u32,
    ) -> Result<Vec<SceneItem>, CatalogError> {
        let url = format!("{}/search", self.base_url);

        let body = SceneSearchBody::new()
            .bbox(bbox.to_vec())
            .datetime(interval)
            .collection(collection)
            .max_cloud_cover(max_cloud_cover)
            .limit(limit);

        tracing::debug!(
            url = %url,
            interval = %interval,
            collection = %collection,
            "Searching scene catalog"
        );

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Parse(format!(
                "Unexpected status {}: {}",
                status, body
            )));
        }

        let items: SceneItemCollection = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(format!("Failed to deserialize items: {}", e)))?;

        tracing::debug!(scenes = items.features.len(), "Catalog search complete");

        Ok(items.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_search_bangalore_window() {
        let client = StacClient::new();
        let bbox = GeoBox::around(
            Coordinates {
                lat: 12.97,
                lon: 77.59,
            },
            0.05,
        );
        let items = client
            .search(&bbox, "2023-01-01/2023-01-30", "sentinel-2-l2a", 10.0, 1)
            .await
            .unwrap();
        assert!(items.len() <= 1);
    }
}
