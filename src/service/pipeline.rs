//! Pipeline orchestrator.
//!
//! Runs a document through two phases: extract and geocode all claims
//! first (no satellite calls), then fetch both observation windows and
//! classify every surviving claim. Claims are processed independently;
//! one claim's failure never affects its siblings.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;

use crate::model::{
    year_window, Claim, ClaimOutcome, Config, GeoBox, GeocodedClaim, RunStats, VerifiedClaim,
};
use crate::service::extraction::ClaimExtractor;
use crate::service::geocode::GeocodeClient;
use crate::service::recognizer::{EntityRecognizer, NerError};
use crate::service::text::TextSource;
use crate::service::vegetation::VegetationService;
use crate::service::verdict::classify;
use crate::service::{catalog::SceneCatalog, raster::RasterStreamer};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Document produced no usable text")]
    NoText,

    #[error("No verifiable locations found in document")]
    NoClaims,

    #[error("Entity recognition failed: {0}")]
    Ner(#[from] NerError),

    #[error("Invalid observation year: {0}")]
    InvalidYear(i32),
}

/// Result of one pipeline run: per-claim outcomes in original claim order
/// plus aggregate counters.
#[derive(Debug)]
pub struct AuditReport {
    pub outcomes: Vec<ClaimOutcome>,
    pub stats: RunStats,
}

impl AuditReport {
    /// The fully verified claims, in claim order.
    pub fn verified(&self) -> Vec<VerifiedClaim> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ClaimOutcome::Verified(v) => Some(v.clone()),
                ClaimOutcome::DataUnavailable { .. } => None,
            })
            .collect()
    }
}

/// Sequences extraction, geocoding, vegetation sampling, and verdicts.
///
/// Constructed once per run with its collaborators injected; holds no
/// state between runs.
pub struct AuditPipeline {
    text: Arc<dyn TextSource>,
    extractor: ClaimExtractor,
    geocoder: Arc<dyn GeocodeClient>,
    vegetation: VegetationService,
    bbox_padding: f64,
    significance_threshold: f64,
    baseline_window: String,
    target_window: String,
}

impl AuditPipeline {
    pub fn new(
        text: Arc<dyn TextSource>,
        recognizer: Arc<dyn EntityRecognizer>,
        geocoder: Arc<dyn GeocodeClient>,
        catalog: Arc<dyn SceneCatalog>,
        raster: Arc<dyn RasterStreamer>,
        config: &Config,
    ) -> Result<Self, PipelineError> {
        let baseline_window = year_window(config.baseline_year)
            .ok_or(PipelineError::InvalidYear(config.baseline_year))?;
        let target_window =
            year_window(config.target_year).ok_or(PipelineError::InvalidYear(config.target_year))?;

        Ok(Self {
            text,
            extractor: ClaimExtractor::new(recognizer, config.extraction.clone()),
            geocoder,
            vegetation: VegetationService::new(catalog, raster, config.imagery.clone()),
            bbox_padding: config.geocode.bbox_padding,
            significance_threshold: config.verdict.significance_threshold,
            baseline_window,
            target_window,
        })
    }

    /// Audit the document at `path`.
    pub async fn run(&self, path: &Path) -> Result<AuditReport, PipelineError> {
        let text = self.text.extract(path);
        if text.trim().is_empty() {
            return Err(PipelineError::NoText);
        }
        self.run_text(&text).await
    }

    /// Audit already-extracted document text.
    pub async fn run_text(&self, text: &str) -> Result<AuditReport, PipelineError> {
        let mut stats = RunStats::default();

        // Phase 1: extract and geocode everything before any satellite call.
        let claims = self.extractor.extract(text).await?;
        stats.claims_extracted = claims.len();

        let mut geocoded = Vec::with_capacity(claims.len());
        for claim in claims {
            match self.geocode_claim(claim).await {
                Ok(gc) => geocoded.push(gc),
                Err(()) => stats.geocode_misses += 1,
            }
        }

        if geocoded.is_empty() {
            return Err(PipelineError::NoClaims);
        }

        // Phase 2: sample and classify. join_all returns results in input
        // order, so outcomes stay keyed to original claim order even
        // though the calls overlap.
        let futures: Vec<_> = geocoded
            .into_iter()
            .map(|gc| self.verify_claim(gc))
            .collect();
        let outcomes = join_all(futures).await;

        for outcome in &outcomes {
            match outcome {
                ClaimOutcome::Verified(_) => stats.verified += 1,
                ClaimOutcome::DataUnavailable { .. } => stats.data_unavailable += 1,
            }
        }

        tracing::info!(
            claims = stats.claims_extracted,
            geocode_misses = stats.geocode_misses,
            verified = stats.verified,
            data_unavailable = stats.data_unavailable,
            "Audit complete"
        );

        Ok(AuditReport { outcomes, stats })
    }

    /// Geocode one claim, dropping it on any miss. `Err` carries no detail;
    /// the miss is already logged and counted by the caller.
    async fn geocode_claim(&self, claim: Claim) -> Result<GeocodedClaim, ()> {
        match self.geocoder.geocode(&claim.location).await {
            Ok(coords) => {
                let bbox = GeoBox::around(coords, self.bbox_padding);
                tracing::info!(
                    location = %claim.location,
                    lat = coords.lat,
                    lon = coords.lon,
                    "Location resolved"
                );
                Ok(GeocodedClaim {
                    claim,
                    coords,
                    bbox,
                })
            }
            Err(e) => {
                tracing::warn!(
                    location = %claim.location,
                    error = %e,
                    "Geocoding failed, dropping claim"
                );
                Err(())
            }
        }
    }

    async fn verify_claim(&self, gc: GeocodedClaim) -> ClaimOutcome {
        let before = self.vegetation.sample(&gc.bbox, &self.baseline_window).await;
        let after = self.vegetation.sample(&gc.bbox, &self.target_window).await;

        match (before, after) {
            (Ok(before), Ok(after)) => {
                let delta = after.value - before.value;
                let verdict = classify(delta, self.significance_threshold);
                tracing::info!(
                    location = %gc.claim.location,
                    before = before.value,
                    after = after.value,
                    delta,
                    verdict = %verdict,
                    "Claim verified"
                );
                ClaimOutcome::Verified(VerifiedClaim {
                    claim: gc.claim,
                    coords: gc.coords,
                    bbox: gc.bbox,
                    before,
                    after,
                    delta,
                    verdict,
                })
            }
            (before, after) => {
                let reason = [before.err(), after.err()]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::warn!(
                    location = %gc.claim.location,
                    reason = %reason,
                    "Satellite data unavailable"
                );
                ClaimOutcome::DataUnavailable {
                    claim: gc.claim,
                    reason,
                }
            }
        }
    }
}
