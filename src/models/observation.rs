//! Normalised (days-to-expiry, strike, implied vol) observations and the
//! normaliser that produces them from raw chain rows.

use crate::config::SurfaceConfig;
use crate::models::option::ChainBatch;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One point of the scattered volatility cloud
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar days from the as-of date to expiration
    pub x: i64,
    /// Strike on the spot's quote scale
    pub y: f64,
    /// Implied volatility as quoted by the feed
    pub z: f64,
}

impl Observation {
    pub fn new(x: i64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// All observations of one request. Order carries no meaning for the fit,
/// but analytics tie-breaks follow it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationSet {
    points: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(points: Vec<Observation>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.points
    }

    /// Shortest days-to-expiry present
    pub fn min_expiry(&self) -> Option<i64> {
        self.points.iter().map(|o| o.x).min()
    }

    pub fn distinct_expiries(&self) -> usize {
        let mut xs: Vec<i64> = self.points.iter().map(|o| o.x).collect();
        xs.sort_unstable();
        xs.dedup();
        xs.len()
    }

    pub fn distinct_strikes(&self) -> usize {
        let mut ys: Vec<f64> = self.points.iter().map(|o| o.y).collect();
        ys.sort_by(f64::total_cmp);
        ys.dedup();
        ys.len()
    }
}

impl From<Vec<Observation>> for ObservationSet {
    fn from(points: Vec<Observation>) -> Self {
        Self::new(points)
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Reshapes chain batches into observations inside a moneyness band around spot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteNormalizer {
    /// Applied to every raw strike before the band test
    pub multiplier: f64,
    /// Relative half-width of the band, e.g. `0.15` for ±15%
    pub band: f64,
}

impl Default for QuoteNormalizer {
    fn default() -> Self {
        Self::from_config(&SurfaceConfig::default())
    }
}

impl QuoteNormalizer {
    pub fn new(multiplier: f64, band: f64) -> Self {
        Self { multiplier, band }
    }

    pub fn from_config(config: &SurfaceConfig) -> Self {
        Self::new(config.spot_multiplier, config.moneyness_band)
    }

    /// Open band `(lower, upper)` a scaled strike has to fall strictly inside
    pub fn band_limits(&self, spot: f64) -> (f64, f64) {
        (spot * (1.0 - self.band), spot * (1.0 + self.band))
    }

    /// Build the observation set for one request.
    ///
    /// Implied vols pass through untouched. An empty result is a valid answer
    /// meaning "nothing quoted inside the band".
    pub fn normalize(&self, batches: &[ChainBatch], as_of: NaiveDate, spot: f64) -> ObservationSet {
        let (lower, upper) = self.band_limits(spot);
        let mut points = Vec::new();

        for batch in batches {
            let days = (batch.expiration - as_of).num_days();
            if days < 0 {
                warn!(
                    "Skipping expired batch {} ({} days before {})",
                    batch.expiration, -days, as_of
                );
                continue;
            }

            let before = points.len();
            for row in &batch.rows {
                let y = row.strike * self.multiplier;
                if lower < y && y < upper {
                    points.push(Observation::new(days, y, row.implied_volatility));
                }
            }
            debug!(
                "Expiration {} ({}d): kept {} of {} rows",
                batch.expiration,
                days,
                points.len() - before,
                batch.rows.len()
            );
        }

        ObservationSet::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::option::RawQuote;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn keeps_rows_strictly_inside_band() {
        let normalizer = QuoteNormalizer::new(1.0, 0.15);
        let batch = ChainBatch::new(
            date(2026, 11, 20),
            vec![
                RawQuote::new(85.0, 0.30),
                RawQuote::new(85.5, 0.29),
                RawQuote::new(100.0, 0.20),
                RawQuote::new(114.9, 0.24),
                RawQuote::new(115.0, 0.25),
            ],
        );
        let obs = normalizer.normalize(&[batch], date(2026, 10, 19), 100.0);
        let ys: Vec<f64> = obs.iter().map(|o| o.y).collect();
        assert_eq!(ys, vec![85.5, 100.0, 114.9]);
        assert!(obs.iter().all(|o| o.x == 32));
    }

    #[test]
    fn applies_multiplier_before_band_test() {
        let normalizer = QuoteNormalizer::new(10.885, 0.15);
        let batch = ChainBatch::new(
            date(2026, 10, 26),
            vec![RawQuote::new(380.0, 0.18), RawQuote::new(300.0, 0.40)],
        );
        let spot = 380.0 * 10.885;
        let obs = normalizer.normalize(&[batch], date(2026, 10, 19), spot);
        assert_eq!(obs.len(), 1);
        let o = obs.as_slice()[0];
        assert_eq!(o.x, 7);
        assert!((o.y - spot).abs() < 1e-9);
        assert_eq!(o.z, 0.18);
    }

    #[test]
    fn vols_pass_through_unvalidated() {
        let normalizer = QuoteNormalizer::new(1.0, 0.15);
        let batch = ChainBatch::new(
            date(2026, 10, 20),
            vec![RawQuote::new(100.0, f64::NAN), RawQuote::new(101.0, -0.1)],
        );
        let obs = normalizer.normalize(&[batch], date(2026, 10, 19), 100.0);
        assert_eq!(obs.len(), 2);
        assert!(obs.as_slice()[0].z.is_nan());
        assert_eq!(obs.as_slice()[1].z, -0.1);
    }

    #[test]
    fn expired_batches_are_skipped() {
        let normalizer = QuoteNormalizer::new(1.0, 0.15);
        let batches = vec![
            ChainBatch::new(date(2026, 10, 1), vec![RawQuote::new(100.0, 0.2)]),
            ChainBatch::new(date(2026, 10, 19), vec![RawQuote::new(100.0, 0.3)]),
        ];
        let obs = normalizer.normalize(&batches, date(2026, 10, 19), 100.0);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs.as_slice()[0].x, 0);
    }

    #[test]
    fn empty_chain_gives_empty_set() {
        let obs = QuoteNormalizer::default().normalize(&[], date(2026, 10, 19), 4000.0);
        assert!(obs.is_empty());
        assert_eq!(obs.min_expiry(), None);
    }

    #[test]
    fn distinct_counts() {
        let obs = ObservationSet::from(vec![
            Observation::new(1, 100.0, 0.2),
            Observation::new(1, 103.0, 0.2),
            Observation::new(7, 100.0, 0.2),
        ]);
        assert_eq!(obs.distinct_expiries(), 2);
        assert_eq!(obs.distinct_strikes(), 2);
        assert_eq!(obs.min_expiry(), Some(1));
    }
}
