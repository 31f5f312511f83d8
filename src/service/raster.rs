//! Raster streaming collaborator.
//!
//! Streams clipped, reprojected band pixels for a selected scene. The
//! heavy lifting (COG reads, warping) lives in an external raster
//! service; this module defines the seam and a thin JSON client.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::model::GeoBox;

const RASTER_BASE_URL_ENV: &str = "RASTER_BASE_URL";
const DEFAULT_RASTER_BASE_URL: &str = "http://127.0.0.1:8091";

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Band missing from response: {0}")]
    MissingBand(String),
}

/// Streams band pixel arrays for one scene, clipped to a box and
/// reprojected to the given reference code.
#[async_trait]
pub trait RasterStreamer: Send + Sync {
    /// Returns one pixel array per requested band, in request order.
    async fn read_bands(
        &self,
        scene_id: &str,
        bands: &[String],
        bbox: &GeoBox,
        resolution: u32,
        epsg: u32,
    ) -> Result<Vec<Vec<f64>>, RasterError>;
}

#[derive(Serialize)]
struct ClipRequest<'a> {
    scene: &'a str,
    bands: &'a [String],
    bbox: Vec<f64>,
    resolution: u32,
    epsg: u32,
}

#[derive(Deserialize)]
struct BandPixels {
    band: String,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct ClipResponse {
    bands: Vec<BandPixels>,
}

/// Client for a band-clipping raster service.
pub struct RasterServiceClient {
    client: Client,
    base_url: String,
}

impl RasterServiceClient {
    /// Create a new raster client.
    ///
    /// The base URL is resolved in this order:
    /// 1. `RASTER_BASE_URL` environment variable if set
    /// 2. Default local service URL
    pub fn new() -> Self {
        let resolved_url = env::var(RASTER_BASE_URL_ENV)
            .ok()
            .unwrap_or_else(|| DEFAULT_RASTER_BASE_URL.to_string());

        Self {
            client: Client::new(),
            base_url: resolved_url,
        }
    }
}

impl Default for RasterServiceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RasterStreamer for RasterServiceClient {
    async fn read_bands(
        &self,
        scene_id: &str,
        bands: &[String],
        bbox: &GeoBox,
        resolution: u32,
        epsg: u32,
    ) -> Result<Vec<Vec<f64>>, RasterError> {
        let url = format!("{}/clip", self.base_url);

        tracing::debug!(scene = %scene_id, bands = ?bands, epsg, "Streaming bands");

        let response = self
            .client
            .post(&url)
            .json(&ClipRequest {
                scene: scene_id,
                bands,
                bbox: bbox.to_vec(),
                resolution,
                epsg,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RasterError::Parse(format!(
                "Unexpected status {}: {}",
                status, body
            )));
        }

        let parsed: ClipResponse = response
            .json()
            .await
            .map_err(|e| RasterError::Parse(format!("Failed to deserialize pixels: {}", e)))?;

        // Return pixels in the order bands were requested, whatever order
        // the service answered in.
        bands
            .iter()
            .map(|name| {
                parsed
                    .bands
                    .iter()
                    .find(|b| &b.band == name)
                    .map(|b| b.values.clone())
                    .ok_or_else(|| RasterError::MissingBand(name.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_response_deserializes() {
        let json = r#"{
            "bands": [
                {"band": "B08", "values": [0.5, 0.6]},
                {"band": "B04", "values": [0.1, 0.2]}
            ]
        }"#;
        let parsed: ClipResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.bands.len(), 2);
        assert_eq!(parsed.bands[1].band, "B04");
        assert_eq!(parsed.bands[1].values, vec![0.1, 0.2]);
    }

    #[test]
    fn clip_request_serializes_bbox_in_order() {
        let bands = vec!["B04".to_string(), "B08".to_string()];
        let request = ClipRequest {
            scene: "scene-1",
            bands: &bands,
            bbox: vec![77.54, 12.92, 77.64, 13.02],
            resolution: 10,
            epsg: 32643,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["scene"], "scene-1");
        assert_eq!(json["bbox"], serde_json::json!([77.54, 12.92, 77.64, 13.02]));
        assert_eq!(json["epsg"], 32643);
    }
}
