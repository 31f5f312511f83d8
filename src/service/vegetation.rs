//! Vegetation index retrieval.
//!
//! Selects a low-cloud scene for a box and date window, resolves its
//! spatial reference, streams the red and near-infrared bands, and
//! aggregates a mean NDVI. Every failure along the way becomes an
//! explicit unavailable result; nothing here crashes the run.

use std::sync::Arc;

use crate::model::config::ImageryConfig;
use crate::model::stac::SceneItem;
use crate::model::{GeoBox, SceneSelection, VegetationSample};
use crate::service::catalog::SceneCatalog;
use crate::service::raster::RasterStreamer;

/// Keeps uniformly dark pixels from dividing by zero.
pub const NDVI_EPSILON: f64 = 1e-8;

#[derive(Debug, thiserror::Error)]
pub enum VegetationError {
    /// No usable sample for this box and window. Carries the operator-facing
    /// reason; contained at the claim level, never escalated.
    #[error("{0}")]
    Unavailable(String),
}

/// Fetches mean NDVI for a bounding box over a date window.
pub struct VegetationService {
    catalog: Arc<dyn SceneCatalog>,
    raster: Arc<dyn RasterStreamer>,
    config: ImageryConfig,
}

impl VegetationService {
    pub fn new(
        catalog: Arc<dyn SceneCatalog>,
        raster: Arc<dyn RasterStreamer>,
        config: ImageryConfig,
    ) -> Self {
        Self {
            catalog,
            raster,
            config,
        }
    }

    /// Fetch the mean NDVI over `bbox` for the ISO interval `interval`.
    pub async fn sample(
        &self,
        bbox: &GeoBox,
        interval: &str,
    ) -> Result<VegetationSample, VegetationError> {
        let scene = self.select_scene(bbox, interval).await?;

        let bands = [
            self.config.red_band.clone(),
            self.config.nir_band.clone(),
        ];

        let pixels = self
            .raster
            .read_bands(&scene.id, &bands, bbox, self.config.resolution, scene.epsg)
            .await
            .map_err(|e| {
                VegetationError::Unavailable(format!(
                    "error processing scene {}: {}",
                    scene.id, e
                ))
            })?;

        let [red, nir]: [Vec<f64>; 2] = pixels.try_into().map_err(|_| {
            VegetationError::Unavailable(format!(
                "expected two bands for scene {}",
                scene.id
            ))
        })?;

        let value = mean_ndvi(&nir, &red).ok_or_else(|| {
            VegetationError::Unavailable(format!(
                "scene {} clipped to an empty raster",
                scene.id
            ))
        })?;

        tracing::debug!(
            scene = %scene.id,
            interval = %interval,
            ndvi = value,
            "Vegetation sample computed"
        );

        Ok(VegetationSample {
            value,
            scene_id: scene.id,
        })
    }

    async fn select_scene(
        &self,
        bbox: &GeoBox,
        interval: &str,
    ) -> Result<SceneSelection, VegetationError> {
        let items = self
            .catalog
            .search(
                bbox,
                interval,
                &self.config.collection,
                self.config.max_cloud_cover,
                1,
            )
            .await
            .map_err(|e| VegetationError::Unavailable(format!("catalog search failed: {}", e)))?;

        let item = items
            .into_iter()
            .next()
            .ok_or_else(|| VegetationError::Unavailable("no clear images found".to_string()))?;

        let epsg = self.resolve_epsg(&item);
        let selection = SceneSelection {
            epsg,
            cloud_cover: item.cloud_cover().unwrap_or_default(),
            id: item.id,
        };

        tracing::debug!(
            scene = %selection.id,
            epsg = selection.epsg,
            cloud_cover = selection.cloud_cover,
            "Scene selected"
        );

        Ok(selection)
    }

    /// Resolve the scene's reference code.
    ///
    /// Catalog metadata schemas vary across providers and versions, so a
    /// fixed fallback chain is applied: numeric `proj:epsg`, then the
    /// string-coded `proj:code`, then the configured default.
    fn resolve_epsg(&self, item: &SceneItem) -> u32 {
        if let Some(code) = item.epsg_direct() {
            return code;
        }
        if let Some(code) = item.epsg_from_code() {
            return code;
        }
        tracing::warn!(
            scene = %item.id,
            assumed = self.config.default_epsg,
            "Scene metadata carries no usable reference code"
        );
        self.config.default_epsg
    }
}

/// Mean NDVI over paired NIR/red pixel arrays:
/// `(nir - red) / (nir + red + epsilon)`, averaged spatially.
///
/// Out-of-range values from noisy input pass through unclamped; the
/// comparator treats them as data. Returns `None` for empty or mismatched
/// inputs.
pub fn mean_ndvi(nir: &[f64], red: &[f64]) -> Option<f64> {
    if nir.is_empty() || nir.len() != red.len() {
        return None;
    }

    let sum: f64 = nir
        .iter()
        .zip(red)
        .map(|(n, r)| (n - r) / (n + r + NDVI_EPSILON))
        .sum();

    Some(sum / nir.len() as f64)
}
