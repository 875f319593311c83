//! Radial basis function interpolation over scattered 2-D samples.

use crate::error::{Result, SurfaceError};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Radial kernel applied to the Euclidean distance between two centres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RbfKernel {
    /// `φ(r) = r`
    Linear,
    /// `φ(r) = r³`
    Cubic,
    /// `φ(r) = r² ln r`
    ThinPlate,
}

impl RbfKernel {
    pub fn apply(self, r: f64) -> f64 {
        match self {
            RbfKernel::Linear => r,
            RbfKernel::Cubic => r * r * r,
            RbfKernel::ThinPlate => {
                if r == 0.0 {
                    0.0
                } else {
                    r * r * r.ln()
                }
            }
        }
    }
}

impl fmt::Display for RbfKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RbfKernel::Linear => write!(f, "linear"),
            RbfKernel::Cubic => write!(f, "cubic"),
            RbfKernel::ThinPlate => write!(f, "thin_plate"),
        }
    }
}

impl FromStr for RbfKernel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(RbfKernel::Linear),
            "cubic" => Ok(RbfKernel::Cubic),
            "thin_plate" | "thin-plate" => Ok(RbfKernel::ThinPlate),
            other => Err(format!("unknown RBF kernel '{}'", other)),
        }
    }
}

/// Exact RBF interpolant `s(p) = Σ wᵢ φ(‖p − cᵢ‖)` through a set of centres
#[derive(Debug, Clone)]
pub struct RbfInterpolator {
    centers: Vec<(f64, f64)>,
    weights: DVector<f64>,
    kernel: RbfKernel,
}

impl RbfInterpolator {
    /// Solve for the kernel weights that reproduce `values` at `points`.
    ///
    /// Repeated centres collapse onto the last value supplied for them.
    pub fn fit(points: &[(f64, f64)], values: &[f64], kernel: RbfKernel) -> Result<Self> {
        if points.len() != values.len() {
            return Err(SurfaceError::NumericInstabilityError(format!(
                "{} centres but {} values",
                points.len(),
                values.len()
            )));
        }

        let mut centers: Vec<(f64, f64)> = Vec::with_capacity(points.len());
        let mut targets: Vec<f64> = Vec::with_capacity(values.len());
        for (&p, &v) in points.iter().zip(values) {
            match centers.iter().position(|&c| c == p) {
                Some(idx) => targets[idx] = v,
                None => {
                    centers.push(p);
                    targets.push(v);
                }
            }
        }

        if centers.is_empty() {
            return Err(SurfaceError::NumericInstabilityError(
                "no centres to interpolate".to_string(),
            ));
        }

        let n = centers.len();
        let matrix = DMatrix::from_fn(n, n, |i, j| kernel.apply(distance(centers[i], centers[j])));
        let weights = solve_weights(matrix, DVector::from_vec(targets))?;

        Ok(Self {
            centers,
            weights,
            kernel,
        })
    }

    pub fn kernel(&self) -> RbfKernel {
        self.kernel
    }

    /// Number of distinct centres the interpolant passes through
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        self.centers
            .iter()
            .zip(self.weights.iter())
            .map(|(&c, &w)| w * self.kernel.apply(distance((x, y), c)))
            .sum()
    }

    /// Evaluate at every point of a pair of coordinate matrices
    pub fn evaluate_mesh(&self, xx: &Array2<f64>, yy: &Array2<f64>) -> Array2<f64> {
        Zip::from(xx)
            .and(yy)
            .map_collect(|&x, &y| self.evaluate(x, y))
    }
}

/// LU solve of the kernel system; a singular matrix or non-finite weights are rejected
fn solve_weights(matrix: DMatrix<f64>, targets: DVector<f64>) -> Result<DVector<f64>> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(SurfaceError::NumericInstabilityError(
            "kernel matrix contains non-finite entries".to_string(),
        ));
    }

    let Some(weights) = matrix.lu().solve(&targets) else {
        return Err(SurfaceError::NumericInstabilityError(format!(
            "singular {}x{} interpolation system",
            targets.len(),
            targets.len()
        )));
    };

    if weights.iter().any(|w| !w.is_finite()) {
        return Err(SurfaceError::NumericInstabilityError(
            "interpolation weights are not finite".to_string(),
        ));
    }

    Ok(weights)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
