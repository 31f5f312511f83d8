use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A sentence asserting an environmental action tied to a location.
///
/// Produced by the extraction stage once a sentence passes the keyword
/// filter and yields at least one accepted location entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Trimmed sentence text with newlines collapsed to spaces.
    pub text: String,
    /// The first accepted entity found in the isolated sentence.
    pub location: String,
}

/// A geocoded point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Padded bounding rectangle in longitude/latitude around a geocoded point.
///
/// Always square in degree-space, not area-accurate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBox {
    /// Build a square box around a point with the given half-width in degrees.
    pub fn around(coords: Coordinates, padding: f64) -> Self {
        Self {
            min_lon: coords.lon - padding,
            min_lat: coords.lat - padding,
            max_lon: coords.lon + padding,
            max_lat: coords.lat + padding,
        }
    }

    /// `[west, south, east, north]`, the order catalog and raster services expect.
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

/// A claim whose location resolved to coordinates. Output of phase 1.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedClaim {
    pub claim: Claim,
    pub coords: Coordinates,
    pub bbox: GeoBox,
}

/// The scene chosen for one fetch call. Transient, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSelection {
    pub id: String,
    /// Resolved spatial reference code (EPSG).
    pub epsg: u32,
    /// Cloud-cover percentage reported by the catalog.
    pub cloud_cover: f64,
}

/// A scalar vegetation index computed for one box and date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationSample {
    pub value: f64,
    pub scene_id: String,
}

/// Three-way classification of vegetation-index change.
///
/// The data-unavailable state is deliberately not a variant here: a claim
/// without both samples is a [`ClaimOutcome::DataUnavailable`], never a
/// `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Vegetation increased, claim appears supported.
    Positive,
    /// Vegetation decreased, claim appears contradicted.
    Suspicious,
    /// No significant change.
    Neutral,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Positive => "POSITIVE",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POSITIVE" => Ok(Verdict::Positive),
            "SUSPICIOUS" => Ok(Verdict::Suspicious),
            "NEUTRAL" => Ok(Verdict::Neutral),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

/// Terminal entity for a fully verified claim: both samples present.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaim {
    pub claim: Claim,
    pub coords: Coordinates,
    pub bbox: GeoBox,
    pub before: VegetationSample,
    pub after: VegetationSample,
    pub delta: f64,
    pub verdict: Verdict,
}

/// Outcome of phase 2 for one geocoded claim.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Verified(VerifiedClaim),
    /// At least one window produced no usable sample.
    DataUnavailable { claim: Claim, reason: String },
}

/// Per-run counters for observability. Logged at run end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub claims_extracted: usize,
    pub geocode_misses: usize,
    pub data_unavailable: usize,
    pub verified: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geobox_padding_is_exact() {
        let coords = Coordinates {
            lat: 12.97,
            lon: 77.59,
        };
        let bbox = GeoBox::around(coords, 0.05);

        assert_eq!(bbox.min_lon, 77.59 - 0.05);
        assert_eq!(bbox.min_lat, 12.97 - 0.05);
        assert_eq!(bbox.max_lon, 77.59 + 0.05);
        assert_eq!(bbox.max_lat, 12.97 + 0.05);
        assert!(bbox.min_lon < bbox.max_lon);
        assert!(bbox.min_lat < bbox.max_lat);
    }

    #[test]
    fn geobox_vec_order_is_west_south_east_north() {
        let bbox = GeoBox {
            min_lon: 1.0,
            min_lat: 2.0,
            max_lon: 3.0,
            max_lat: 4.0,
        };
        assert_eq!(bbox.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn verdict_round_trips_through_display() {
        for v in [Verdict::Positive, Verdict::Suspicious, Verdict::Neutral] {
            assert_eq!(v.to_string().parse::<Verdict>().unwrap(), v);
        }
        assert!("MAYBE".parse::<Verdict>().is_err());
    }
}
