//! Near-term skew statistics and the regime label derived from them.

use crate::config::SurfaceConfig;
use crate::error::{Result, SurfaceError};
use crate::models::observation::{Observation, ObservationSet};
use crate::models::option::{SpotPrice, SpotSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Bullish,
    Neutral,
    Bearish,
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Regime::Bullish => write!(f, "BULLISH"),
            Regime::Neutral => write!(f, "NEUTRAL"),
            Regime::Bearish => write!(f, "BEARISH"),
        }
    }
}

/// Cut points for the regime label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeThresholds {
    /// Skew strictly above this is bearish
    pub bearish_above: f64,
    /// Skew strictly below this is bullish
    pub bullish_below: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            bearish_above: 0.02,
            bullish_below: 0.0,
        }
    }
}

impl RegimeThresholds {
    /// A NaN skew matches neither cut and lands on neutral
    pub fn classify(&self, skew: f64) -> Regime {
        if skew > self.bearish_above {
            Regime::Bearish
        } else if skew < self.bullish_below {
            Regime::Bullish
        } else {
            Regime::Neutral
        }
    }
}

/// Display colour of the skew readout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkewTone {
    Red,
    Green,
    Gold,
}

impl SkewTone {
    pub fn hex(self) -> &'static str {
        match self {
            SkewTone::Red => "#f85149",
            SkewTone::Green => "#2ea043",
            SkewTone::Gold => "#d29922",
        }
    }
}

/// Cut points for the display colour. Deliberately separate from
/// [`RegimeThresholds`]: the two use different values and must not be merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneThresholds {
    pub red_above: f64,
    pub green_below: f64,
}

impl Default for ToneThresholds {
    fn default() -> Self {
        Self {
            red_above: 0.04,
            green_below: -0.01,
        }
    }
}

impl ToneThresholds {
    pub fn classify(&self, skew: f64) -> SkewTone {
        if skew > self.red_above {
            SkewTone::Red
        } else if skew < self.green_below {
            SkewTone::Green
        } else {
            SkewTone::Gold
        }
    }
}

/// Output of [`RiskAnalytics::analyze`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkewMetrics {
    /// Days-to-expiry of the slice the statistics were read from
    pub near_term_days: i64,
    pub atm_vol: f64,
    pub otm_vol: f64,
    pub skew: f64,
    pub regime: Regime,
}

/// Per-request metrics handed to presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub spot: f64,
    pub spot_source: SpotSource,
    pub near_term_days: i64,
    pub atm_vol: f64,
    pub otm_vol: f64,
    pub skew: f64,
    pub regime: Regime,
}

impl Metrics {
    pub fn new(spot: SpotPrice, skew: SkewMetrics) -> Self {
        Self {
            spot: spot.value,
            spot_source: spot.source,
            near_term_days: skew.near_term_days,
            atm_vol: skew.atm_vol,
            otm_vol: skew.otm_vol,
            skew: skew.skew,
            regime: skew.regime,
        }
    }

    /// The footer readout: spot, ATM vol, skew and regime
    pub fn summary_lines(&self, otm_offset: f64) -> [String; 4] {
        [
            format!("SPOT PRICE: ${:.2} ({})", self.spot, self.spot_source),
            format!("ATM VOL: {:.2}%", self.atm_vol * 100.0),
            format!("SKEW (+{}): {:.4}", otm_offset, self.skew),
            format!("REGIME: {}", self.regime),
        ]
    }
}

/// Reads ATM vol and a fixed-offset wing vol off the shortest expiry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAnalytics {
    /// Absolute strike distance above spot used as the wing
    pub otm_offset: f64,
    pub thresholds: RegimeThresholds,
}

impl Default for RiskAnalytics {
    fn default() -> Self {
        Self::from_config(&SurfaceConfig::default())
    }
}

impl RiskAnalytics {
    pub fn new(otm_offset: f64, thresholds: RegimeThresholds) -> Self {
        Self {
            otm_offset,
            thresholds,
        }
    }

    pub fn from_config(config: &SurfaceConfig) -> Self {
        Self::new(config.otm_offset, config.regime)
    }

    pub fn analyze(&self, obs: &ObservationSet, spot: f64) -> Result<SkewMetrics> {
        let near_term_days = obs.min_expiry().ok_or(SurfaceError::NoNearTermDataError)?;
        let near_term: Vec<&Observation> =
            obs.iter().filter(|o| o.x == near_term_days).collect();

        let atm_vol = nearest(&near_term, spot)
            .map(|o| o.z)
            .ok_or(SurfaceError::NoNearTermDataError)?;
        let otm_vol = nearest(&near_term, spot + self.otm_offset)
            .map(|o| o.z)
            .unwrap_or(atm_vol);

        let skew = otm_vol - atm_vol;
        let regime = self.thresholds.classify(skew);

        debug!(
            "Near-term slice {}d ({} quotes): atm={:.4} otm={:.4} skew={:.4} regime={}",
            near_term_days,
            near_term.len(),
            atm_vol,
            otm_vol,
            skew,
            regime
        );

        Ok(SkewMetrics {
            near_term_days,
            atm_vol,
            otm_vol,
            skew,
            regime,
        })
    }
}

/// Observation whose strike is closest to `target`; exact ties go to the
/// earliest one in input order and NaN distances never win.
fn nearest<'a>(slice: &[&'a Observation], target: f64) -> Option<&'a Observation> {
    slice
        .iter()
        .copied()
        .min_by(|a, b| (a.y - target).abs().total_cmp(&(b.y - target).abs()))
}
