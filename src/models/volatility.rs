//! Dense volatility surface fitted over the scattered observation cloud.

use crate::config::SurfaceConfig;
use crate::error::{Result, SurfaceError};
use crate::models::observation::ObservationSet;
use crate::utils::{linspace, meshgrid, RbfInterpolator, RbfKernel};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Evaluated surface on a regular mesh.
///
/// Rows follow the strike axis and columns the expiry axis, so
/// `xi[[i, j]] == expiry_axis[j]` and `yi[[i, j]] == strike_axis[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Days-to-expiry sample points
    pub expiry_axis: Array1<f64>,
    /// Strike sample points
    pub strike_axis: Array1<f64>,
    pub xi: Array2<f64>,
    pub yi: Array2<f64>,
    /// Interpolated implied volatilities
    pub zi: Array2<f64>,
}

impl Grid {
    /// `(rows, cols)` of the evaluated mesh
    pub fn shape(&self) -> (usize, usize) {
        self.zi.dim()
    }

    pub fn value_at(&self, row: usize, col: usize) -> Option<f64> {
        self.zi.get((row, col)).copied()
    }

    /// Row-major copy of the heights, the layout 3-D plotting widgets expect
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.zi.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Lowest and highest interpolated vol
    pub fn z_range(&self) -> (f64, f64) {
        self.zi.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| {
            (lo.min(z), hi.max(z))
        })
    }
}

/// Fits an exact RBF interpolant through the observations and samples it on a grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFitter {
    pub grid_size: usize,
    pub kernel: RbfKernel,
}

impl Default for SurfaceFitter {
    fn default() -> Self {
        Self::from_config(&SurfaceConfig::default())
    }
}

impl SurfaceFitter {
    pub fn new(grid_size: usize, kernel: RbfKernel) -> Self {
        Self { grid_size, kernel }
    }

    pub fn from_config(config: &SurfaceConfig) -> Self {
        Self::new(config.grid_size, config.kernel)
    }

    /// Fit the interpolant without sampling it
    pub fn interpolant(&self, obs: &ObservationSet) -> Result<RbfInterpolator> {
        self.check_input(obs)?;

        let points: Vec<(f64, f64)> = obs.iter().map(|o| (o.x as f64, o.y)).collect();
        let values: Vec<f64> = obs.iter().map(|o| o.z).collect();
        RbfInterpolator::fit(&points, &values, self.kernel)
    }

    /// Fit the surface and evaluate it over `[min x, max x] × [min y, max y]`
    pub fn fit(&self, obs: &ObservationSet) -> Result<Grid> {
        let rbf = self.interpolant(obs)?;

        let (x_min, x_max) = obs
            .iter()
            .fold((i64::MAX, i64::MIN), |(lo, hi), o| (lo.min(o.x), hi.max(o.x)));
        let (y_min, y_max) = obs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), o| {
                (lo.min(o.y), hi.max(o.y))
            });

        let expiry_axis = linspace(x_min as f64, x_max as f64, self.grid_size);
        let strike_axis = linspace(y_min, y_max, self.grid_size);
        let (xi, yi) = meshgrid(&expiry_axis, &strike_axis);
        let zi = rbf.evaluate_mesh(&xi, &yi);

        if zi.iter().any(|z| !z.is_finite()) {
            return Err(SurfaceError::NumericInstabilityError(
                "interpolated surface contains non-finite values".to_string(),
            ));
        }

        debug!(
            "Fitted {} kernel through {} centres onto {}x{} grid",
            self.kernel,
            rbf.len(),
            self.grid_size,
            self.grid_size
        );

        Ok(Grid {
            expiry_axis,
            strike_axis,
            xi,
            yi,
            zi,
        })
    }

    fn check_input(&self, obs: &ObservationSet) -> Result<()> {
        if obs.is_empty() {
            return Err(SurfaceError::InsufficientDataError(
                "no observations to fit".to_string(),
            ));
        }
        if self.grid_size < 2 {
            return Err(SurfaceError::InsufficientDataError(format!(
                "grid size {} cannot span a surface",
                self.grid_size
            )));
        }
        if obs.iter().any(|o| !o.y.is_finite()) {
            return Err(SurfaceError::InsufficientDataError(
                "observation strike is not finite".to_string(),
            ));
        }

        let expiries = obs.distinct_expiries();
        let strikes = obs.distinct_strikes();
        if expiries < 2 || strikes < 2 {
            warn!(
                "Degenerate observation span: {} expiries, {} strikes",
                expiries, strikes
            );
            return Err(SurfaceError::InsufficientDataError(format!(
                "need at least 2 distinct expiries and 2 distinct strikes, got {} and {}",
                expiries, strikes
            )));
        }

        if let Some(bad) = obs.iter().find(|o| !o.z.is_finite()) {
            return Err(SurfaceError::NumericInstabilityError(format!(
                "implied volatility {} at ({}, {}) is not finite",
                bad.z, bad.x, bad.y
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::Observation;
    use approx::assert_relative_eq;

    fn square() -> ObservationSet {
        ObservationSet::from(vec![
            Observation::new(1, 100.0, 0.20),
            Observation::new(1, 103.0, 0.22),
            Observation::new(7, 100.0, 0.19),
            Observation::new(7, 103.0, 0.21),
        ])
    }

    #[test]
    fn grid_is_thirty_by_thirty() {
        let grid = SurfaceFitter::default().fit(&square()).unwrap();
        assert_eq!(grid.shape(), (30, 30));
        assert_eq!(grid.expiry_axis[0], 1.0);
        assert_eq!(grid.expiry_axis[29], 7.0);
        assert_eq!(grid.strike_axis[0], 100.0);
        assert_eq!(grid.strike_axis[29], 103.0);
    }

    #[test]
    fn grid_corners_hit_the_quotes() {
        let grid = SurfaceFitter::default().fit(&square()).unwrap();
        assert_relative_eq!(grid.value_at(0, 0).unwrap(), 0.20, max_relative = 1e-9);
        assert_relative_eq!(grid.value_at(29, 0).unwrap(), 0.22, max_relative = 1e-9);
        assert_relative_eq!(grid.value_at(0, 29).unwrap(), 0.19, max_relative = 1e-9);
        assert_relative_eq!(grid.value_at(29, 29).unwrap(), 0.21, max_relative = 1e-9);
    }

    #[test]
    fn single_observation_is_insufficient() {
        let obs = ObservationSet::from(vec![Observation::new(3, 4000.0, 0.18)]);
        assert!(matches!(
            SurfaceFitter::default().fit(&obs),
            Err(SurfaceError::InsufficientDataError(_))
        ));
    }

    #[test]
    fn single_expiry_is_insufficient() {
        let obs = ObservationSet::from(vec![
            Observation::new(3, 4000.0, 0.18),
            Observation::new(3, 4100.0, 0.19),
        ]);
        assert!(matches!(
            SurfaceFitter::default().fit(&obs),
            Err(SurfaceError::InsufficientDataError(_))
        ));
    }

    #[test]
    fn empty_set_is_insufficient() {
        assert!(matches!(
            SurfaceFitter::default().fit(&ObservationSet::default()),
            Err(SurfaceError::InsufficientDataError(_))
        ));
    }

    #[test]
    fn non_finite_vol_is_numeric_instability() {
        let mut points = square().as_slice().to_vec();
        points[2].z = f64::NAN;
        assert!(matches!(
            SurfaceFitter::default().fit(&ObservationSet::from(points)),
            Err(SurfaceError::NumericInstabilityError(_))
        ));
    }

    #[test]
    fn non_finite_strike_is_insufficient() {
        let mut points = square().as_slice().to_vec();
        points[1].y = f64::INFINITY;
        assert!(matches!(
            SurfaceFitter::default().fit(&ObservationSet::from(points)),
            Err(SurfaceError::InsufficientDataError(_))
        ));
    }
}
