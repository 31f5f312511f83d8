//! STAC (SpatioTemporal Asset Catalog) wire models.
//!
//! Lightweight serde models for STAC Item Search (POST /search), covering
//! the subset the pipeline needs: bbox, datetime interval, collection and
//! cloud-cover filtering, and per-item projection metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body for `POST /search` (STAC API - Item Search).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSearchBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// ISO 8601 interval, `"start/end"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Property query, e.g. `{"eo:cloud_cover": {"lt": 10.0}}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<serde_json::Value>,
}

impl SceneSearchBody {
    pub fn new() -> Self {
        Self {
            bbox: None,
            datetime: None,
            collections: None,
            limit: None,
            query: None,
        }
    }

    /// Set the bounding box `[west, south, east, north]`.
    pub fn bbox(mut self, bbox: Vec<f64>) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn datetime(mut self, interval: &str) -> Self {
        self.datetime = Some(interval.to_string());
        self
    }

    pub fn collection(mut self, collection: &str) -> Self {
        self.collections = Some(vec![collection.to_string()]);
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Restrict to scenes with cloud cover strictly below `percent`.
    pub fn max_cloud_cover(mut self, percent: f64) -> Self {
        self.query = Some(serde_json::json!({ "eo:cloud_cover": { "lt": percent } }));
        self
    }
}

impl Default for SceneSearchBody {
    fn default() -> Self {
        Self::new()
    }
}

/// A STAC Item Collection (GeoJSON FeatureCollection).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneItemCollection {
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<SceneItem>,
}

/// A single STAC Item (GeoJSON Feature).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneItem {
    /// Unique scene identifier.
    pub id: String,

    pub properties: SceneProperties,

    /// Collection this item belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

impl SceneItem {
    pub fn cloud_cover(&self) -> Option<f64> {
        self.properties.eo_cloud_cover
    }

    /// Numeric `proj:epsg` property, when the catalog provides one.
    pub fn epsg_direct(&self) -> Option<u32> {
        self.properties
            .extra
            .get("proj:epsg")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
    }

    /// Numeric suffix of a string-coded `proj:code` property
    /// (`"EPSG:32643"` -> `32643`). Newer catalog schemas use this field
    /// instead of `proj:epsg`.
    pub fn epsg_from_code(&self) -> Option<u32> {
        self.properties
            .extra
            .get("proj:code")
            .and_then(|v| v.as_str())
            .and_then(|s| s.rsplit(':').next())
            .and_then(|n| n.parse().ok())
    }
}

/// STAC Item properties.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneProperties {
    /// ISO 8601 acquisition datetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Cloud cover percentage (EO extension).
    #[serde(rename = "eo:cloud_cover", skip_serializing_if = "Option::is_none")]
    pub eo_cloud_cover: Option<f64>,

    /// All other properties, including the projection extension fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
