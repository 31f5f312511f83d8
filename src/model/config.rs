use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const ENV_CONFIG_PATH: &str = "TERRACLAIM_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

fn default_keywords() -> Vec<String> {
    [
        "planted",
        "restored",
        "reforestation",
        "conservation",
        "project",
        "located",
        "water",
        "mining",
        "replanted",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// Wider than strict geopolitical labels on purpose: small NER models
// routinely tag non-Western place names as PERSON or NORP.
fn default_accepted_labels() -> Vec<String> {
    ["GPE", "LOC", "ORG", "PERSON", "NORP"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_geocode_timeout_secs() -> u64 {
    10
}

fn default_bbox_padding() -> f64 {
    0.05
}

fn default_collection() -> String {
    "sentinel-2-l2a".to_string()
}

fn default_max_cloud_cover() -> f64 {
    10.0
}

fn default_red_band() -> String {
    "B04".to_string()
}

fn default_nir_band() -> String {
    "B08".to_string()
}

fn default_resolution() -> u32 {
    10
}

fn default_epsg() -> u32 {
    // Web Mercator, the last resort when scene metadata has no usable code.
    3857
}

fn default_significance_threshold() -> f64 {
    0.05
}

/// Sentence filtering and entity acceptance configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Lowercase substrings a sentence must contain to count as a claim.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Entity labels accepted as location candidates.
    #[serde(default = "default_accepted_labels")]
    pub accepted_labels: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            accepted_labels: default_accepted_labels(),
        }
    }
}

/// Geocoding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeConfig {
    #[serde(default = "default_geocode_timeout_secs")]
    pub timeout_secs: u64,
    /// Half-width of the box derived around a geocoded point, in degrees.
    #[serde(default = "default_bbox_padding")]
    pub bbox_padding: f64,
}

impl GeocodeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_geocode_timeout_secs(),
            bbox_padding: default_bbox_padding(),
        }
    }
}

/// Satellite imagery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageryConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Scenes at or above this cloud-cover percentage are never used.
    #[serde(default = "default_max_cloud_cover")]
    pub max_cloud_cover: f64,
    #[serde(default = "default_red_band")]
    pub red_band: String,
    #[serde(default = "default_nir_band")]
    pub nir_band: String,
    /// Ground resolution for band streaming.
    #[serde(default = "default_resolution")]
    pub resolution: u32,
    /// Reference code assumed when scene metadata carries none.
    #[serde(default = "default_epsg")]
    pub default_epsg: u32,
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            max_cloud_cover: default_max_cloud_cover(),
            red_band: default_red_band(),
            nir_band: default_nir_band(),
            resolution: default_resolution(),
            default_epsg: default_epsg(),
        }
    }
}

/// Verdict classification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VerdictConfig {
    /// Minimum absolute NDVI delta treated as significant.
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            significance_threshold: default_significance_threshold(),
        }
    }
}

/// YAML configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub geocode: GeocodeConfig,
    #[serde(default)]
    pub imagery: ImageryConfig,
    #[serde(default)]
    pub verdict: VerdictConfig,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub geocode: GeocodeConfig,
    pub imagery: ImageryConfig,
    pub verdict: VerdictConfig,
    /// Year of the baseline observation window.
    pub baseline_year: i32,
    /// Year of the target observation window.
    pub target_year: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            geocode: GeocodeConfig::default(),
            imagery: ImageryConfig::default(),
            verdict: VerdictConfig::default(),
            baseline_year: 2022,
            target_year: 2023,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file.
    pub fn from_env() -> Self {
        let baseline_year = std::env::var("BASELINE_YEAR")
            .ok()
            .and_then(|y| y.parse().ok())
            .unwrap_or(2022);

        let target_year = std::env::var("TARGET_YEAR")
            .ok()
            .and_then(|y| y.parse().ok())
            .unwrap_or(2023);

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        Self {
            extraction: file.extraction,
            geocode: file.geocode,
            imagery: file.imagery,
            verdict: file.verdict,
            baseline_year,
            target_year,
        }
    }

    /// Load configuration from YAML file.
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }
}

/// ISO 8601 interval covering the first 30 days of January for `year`.
///
/// Returns `None` for years `chrono` cannot represent.
pub fn year_window(year: i32) -> Option<String> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year, 1, 30)?;
    Some(format!("{start}/{end}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = Config::default();
        assert!(config.extraction.keywords.contains(&"reforestation".into()));
        assert!(config.extraction.accepted_labels.contains(&"PERSON".into()));
        assert_eq!(config.geocode.bbox_padding, 0.05);
        assert_eq!(config.geocode.timeout(), Duration::from_secs(10));
        assert_eq!(config.imagery.max_cloud_cover, 10.0);
        assert_eq!(config.imagery.default_epsg, 3857);
        assert_eq!(config.verdict.significance_threshold, 0.05);
    }

    #[test]
    fn partial_yaml_fills_missing_sections() {
        let file: ConfigFile =
            serde_yaml::from_str("extraction:\n  keywords: [\"wetland\"]\n").unwrap();
        assert_eq!(file.extraction.keywords, vec!["wetland".to_string()]);
        // Untouched sections keep their defaults.
        assert_eq!(file.extraction.accepted_labels, default_accepted_labels());
        assert_eq!(file.imagery.collection, "sentinel-2-l2a");
    }

    #[test]
    fn year_window_formats_iso_interval() {
        assert_eq!(year_window(2022).as_deref(), Some("2022-01-01/2022-01-30"));
        assert_eq!(year_window(2023).as_deref(), Some("2023-01-01/2023-01-30"));
    }
}
