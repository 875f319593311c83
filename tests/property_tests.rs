//! Property-based tests using proptest.
//!
//! Cover the band filter, exact interpolation, grid shape, skew/regime
//! consistency and determinism over random chains.

use chrono::NaiveDate;
use live_volsurf::models::{
    ChainBatch, Observation, ObservationSet, QuoteNormalizer, RawQuote, Regime, RiskAnalytics,
    SurfaceFitter,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// Distinct (days, strike) nodes with at least two of each coordinate
fn scattered_cloud() -> impl Strategy<Value = ObservationSet> {
    prop::collection::btree_set((1i64..60, 0u32..200), 4..24)
        .prop_flat_map(|nodes: BTreeSet<(i64, u32)>| {
            let n = nodes.len();
            (Just(nodes), prop::collection::vec(0.08f64..0.60, n))
        })
        .prop_map(|(nodes, vols)| {
            ObservationSet::from(
                nodes
                    .into_iter()
                    .zip(vols)
                    .map(|((x, k), z)| Observation::new(x, 3500.0 + 5.0 * k as f64, z))
                    .collect::<Vec<_>>(),
            )
        })
        .prop_filter("needs a 2-D span", |obs| {
            obs.distinct_expiries() >= 2 && obs.distinct_strikes() >= 2
        })
}

// --- Band filter ---

proptest! {
    #[test]
    fn normalized_strikes_stay_strictly_inside_band(
        spot in 100.0f64..10_000.0,
        strikes in prop::collection::vec(0.5f64..2.0, 1..50),
    ) {
        let normalizer = QuoteNormalizer::new(1.0, 0.15);
        let mut rows: Vec<RawQuote> = strikes.iter().map(|m| RawQuote::new(spot * m, 0.2)).collect();
        rows.push(RawQuote::new(spot * 0.85, 0.2));
        rows.push(RawQuote::new(spot * 1.15, 0.2));

        let batch = ChainBatch::new(as_of().succ_opt().unwrap(), rows);
        let obs = normalizer.normalize(&[batch], as_of(), spot);

        for o in obs.iter() {
            prop_assert!(spot * 0.85 < o.y && o.y < spot * 1.15, "y={} spot={}", o.y, spot);
        }
        prop_assert!(obs.iter().all(|o| o.y != spot * 0.85 && o.y != spot * 1.15));
    }
}

/// A spot whose band edge `spot * factor` lands exactly on `y`, if one exists
/// within a few ulps of `y / factor`
fn spot_with_edge_at(y: f64, factor: f64) -> Option<f64> {
    let guess = (y / factor).to_bits() as i64;
    (-3i64..=3)
        .map(|d| f64::from_bits((guess + d) as u64))
        .find(|spot| spot * factor == y)
}

proptest! {
    #[test]
    fn futures_scaled_strike_on_band_edge_is_excluded(
        strike in 300.0f64..450.0,
        upper_edge in any::<bool>(),
    ) {
        let multiplier = 10.885;
        let band = 0.15;
        let y = strike * multiplier;
        let factor = if upper_edge { 1.0 + band } else { 1.0 - band };
        let spot = spot_with_edge_at(y, factor);
        prop_assume!(spot.is_some());
        let spot = spot.unwrap();

        let normalizer = QuoteNormalizer::new(multiplier, band);
        let rows = vec![
            RawQuote::new(strike, 0.2),
            RawQuote::new(spot / multiplier, 0.2),
        ];
        let batch = ChainBatch::new(as_of().succ_opt().unwrap(), rows);
        let obs = normalizer.normalize(&[batch], as_of(), spot);

        prop_assert_eq!(obs.len(), 1, "edge strike {} at spot {} was kept", strike, spot);
        prop_assert!(obs.iter().all(|o| o.y != y));
    }
}

// --- Exact interpolation ---

proptest! {
    #[test]
    fn linear_rbf_passes_through_every_quote(obs in scattered_cloud()) {
        let rbf = SurfaceFitter::default().interpolant(&obs).unwrap();
        for o in obs.iter() {
            let fitted = rbf.evaluate(o.x as f64, o.y);
            prop_assert!(
                (fitted - o.z).abs() <= 1e-6 * o.z.abs(),
                "fitted {} vs quoted {} at ({}, {})", fitted, o.z, o.x, o.y
            );
        }
    }
}

// --- Grid shape ---

proptest! {
    #[test]
    fn grid_is_always_thirty_square(obs in scattered_cloud()) {
        let grid = SurfaceFitter::default().fit(&obs).unwrap();
        prop_assert_eq!(grid.shape(), (30, 30));
        prop_assert!(grid.zi.iter().all(|z| z.is_finite()));
    }
}

// --- Skew sign consistency ---

proptest! {
    #[test]
    fn rising_wing_is_never_bullish(
        spot in 3000.0f64..5000.0,
        atm in 0.05f64..0.8,
        bump in 0.0001f64..0.5,
    ) {
        let obs = ObservationSet::from(vec![
            Observation::new(3, spot, atm),
            Observation::new(3, spot + 300.0, atm + bump),
        ]);
        let m = RiskAnalytics::default().analyze(&obs, spot).unwrap();
        prop_assert!(m.otm_vol > m.atm_vol);
        prop_assert!(m.skew > 0.0);
        prop_assert_ne!(m.regime, Regime::Bullish);
    }
}

// --- Determinism ---

proptest! {
    #[test]
    fn identical_input_gives_identical_output(obs in scattered_cloud(), spot in 3500.0f64..4500.0) {
        let fitter = SurfaceFitter::default();
        let analytics = RiskAnalytics::default();

        prop_assert_eq!(fitter.fit(&obs).unwrap(), fitter.fit(&obs).unwrap());
        prop_assert_eq!(
            analytics.analyze(&obs, spot).unwrap(),
            analytics.analyze(&obs, spot).unwrap()
        );
    }
}
