//! Composition root of the surface pipeline: normalise, then fit and analyse.

use crate::config::SurfaceConfig;
use crate::error::Result;
use crate::models::{
    ChainBatch, Grid, Metrics, ObservationSet, QuoteNormalizer, RiskAnalytics, SpotPrice,
    SurfaceFitter,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything one refresh hands to presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSnapshot {
    pub as_of: NaiveDate,
    /// The quoted points the surface was fitted through
    pub observations: ObservationSet,
    pub grid: Grid,
    pub metrics: Metrics,
}

impl SurfaceSnapshot {
    pub fn into_parts(self) -> (Grid, Metrics) {
        (self.grid, self.metrics)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceAssembler {
    pub normalizer: QuoteNormalizer,
    pub fitter: SurfaceFitter,
    pub analytics: RiskAnalytics,
}

impl Default for SurfaceAssembler {
    fn default() -> Self {
        Self::from_config(&SurfaceConfig::default())
    }
}

impl SurfaceAssembler {
    pub fn from_config(config: &SurfaceConfig) -> Self {
        Self {
            normalizer: QuoteNormalizer::from_config(config),
            fitter: SurfaceFitter::from_config(config),
            analytics: RiskAnalytics::from_config(config),
        }
    }

    /// Run one full recomputation. Either both the grid and the metrics come
    /// back or a single error does; when fitting and analytics both fail the
    /// fitter's error is reported.
    pub fn assemble(
        &self,
        batches: &[ChainBatch],
        as_of: NaiveDate,
        spot: SpotPrice,
    ) -> Result<SurfaceSnapshot> {
        let observations = self.normalizer.normalize(batches, as_of, spot.value);
        debug!(
            "Normalized {} observations across {} expiries (spot {:.2} {})",
            observations.len(),
            observations.distinct_expiries(),
            spot.value,
            spot.source
        );

        let (grid, skew) = rayon::join(
            || self.fitter.fit(&observations),
            || self.analytics.analyze(&observations, spot.value),
        );
        let grid = grid?;
        let metrics = Metrics::new(spot, skew?);

        info!(
            "Surface ready: atm={:.4} skew={:.4} regime={}",
            metrics.atm_vol, metrics.skew, metrics.regime
        );

        Ok(SurfaceSnapshot {
            as_of,
            observations,
            grid,
            metrics,
        })
    }
}
