//! Geocoding collaborator.
//!
//! Resolves free-text place names to coordinates. One bounded attempt per
//! claim: no retries and no fallback provider, since geocoding quality
//! bounds the whole pipeline and ambiguous names are a known limitation.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::Coordinates;

const GEOCODER_BASE_URL_ENV: &str = "GEOCODER_BASE_URL";
const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";

// Nominatim's usage policy requires an identifying agent.
const USER_AGENT: &str = "terraclaim/0.1 (environmental-claim-audit)";

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Location not found: {0}")]
    NotFound(String),

    #[error("Geocoding timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeocodeError::Timeout
        } else {
            GeocodeError::Http(e)
        }
    }
}

/// Resolves a place name to coordinates. Implementations must not retry.
#[async_trait]
pub trait GeocodeClient: Send + Sync {
    async fn geocode(&self, place: &str) -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Client for a Nominatim-style JSON search endpoint.
pub struct NominatimClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl NominatimClient {
    /// Create a new geocoding client with a per-request timeout.
    ///
    /// The base URL is resolved in this order:
    /// 1. `GEOCODER_BASE_URL` environment variable if set
    /// 2. The public Nominatim endpoint
    pub fn new(timeout: Duration) -> Self {
        let resolved_url = env::var(GEOCODER_BASE_URL_ENV)
            .ok()
            .unwrap_or_else(|| DEFAULT_GEOCODER_BASE_URL.to_string());

        Self {
            client: Client::new(),
            base_url: resolved_url,
            timeout,
        }
    }
}

#[async_trait]
impl GeocodeClient for NominatimClient {
    async fn geocode(&self, place: &str) -> Result<Coordinates, GeocodeError> {
        let url = format!("{}/search", self.base_url);

        tracing::debug!(place = %place, "Geocoding location");

        let response = self
            .client
            .get(&url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GeocodeError::Parse(format!(
                "Unexpected status {}: {}",
                status, place
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(format!("Failed to deserialize places: {}", e)))?;

        let first = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(place.to_string()))?;

        let lat: f64 = first
            .lat
            .parse()
            .map_err(|_| GeocodeError::Parse(format!("Bad latitude: {}", first.lat)))?;
        let lon: f64 = first
            .lon
            .parse()
            .map_err(|_| GeocodeError::Parse(format!("Bad longitude: {}", first.lon)))?;

        tracing::debug!(place = %place, lat, lon, "Location resolved");

        Ok(Coordinates { lat, lon })
    }
}
