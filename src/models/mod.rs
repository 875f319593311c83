//! Data models for option chains, observations, surfaces and risk metrics
//!
//! This module contains the raw chain inputs, the quote normalizer, the
//! surface fitter and the skew analytics.

mod metrics;
mod observation;
mod option;
mod volatility;

pub use metrics::*;
pub use observation::*;
pub use option::*;
pub use volatility::*;
