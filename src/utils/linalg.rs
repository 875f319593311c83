use ndarray::{Array1, Array2};

/// `n` evenly spaced values over `[start, end]`, endpoints included
pub fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => Array1::from_elem(1, start),
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values = Array1::from_shape_fn(n, |i| start + step * i as f64);
            // Pin the last point so rounding never pushes it past the range
            values[n - 1] = end;
            values
        }
    }
}

/// Coordinate matrices for a rectangular grid.
///
/// Follows the numpy convention: both outputs have shape `(ys.len(), xs.len())`,
/// `xx[[i, j]] == xs[j]` and `yy[[i, j]] == ys[i]`.
pub fn meshgrid(xs: &Array1<f64>, ys: &Array1<f64>) -> (Array2<f64>, Array2<f64>) {
    let shape = (ys.len(), xs.len());
    let xx = Array2::from_shape_fn(shape, |(_, j)| xs[j]);
    let yy = Array2::from_shape_fn(shape, |(i, _)| ys[i]);
    (xx, yy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn linspace_includes_endpoints() {
        let v = linspace(1.0, 7.0, 30);
        assert_eq!(v.len(), 30);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[29], 7.0);
        assert_abs_diff_eq!(v[1] - v[0], 6.0 / 29.0, epsilon = 1e-12);
    }

    #[test]
    fn meshgrid_uses_row_per_y() {
        let (xx, yy) = meshgrid(&array![1.0, 2.0, 3.0], &array![10.0, 20.0]);
        assert_eq!(xx.dim(), (2, 3));
        assert_eq!(xx[[1, 2]], 3.0);
        assert_eq!(yy[[1, 2]], 20.0);
        assert_eq!(yy[[0, 1]], 10.0);
    }
}
