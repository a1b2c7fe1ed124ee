//! Simple least-squares regression over paired samples.

use crate::error::{ScoutError, ScoutResult};
use crate::table::NumericColumn;

/// Slope and intercept of the least-squares line through paired samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Drop every row where either side is missing, keeping the surviving pairs
/// in row order.
pub fn paired_samples(x: &NumericColumn, y: &NumericColumn) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y.iter())
        .filter_map(|(xv, yv)| match (xv, yv) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        })
        .collect()
}

impl RegressionFit {
    /// Ordinary least squares over the given pairs.
    ///
    /// Fails explicitly with fewer than two samples, or when every x is
    /// identical (the slope would be undefined); never returns NaN.
    pub fn fit(pairs: &[(f64, f64)]) -> ScoutResult<Self> {
        if pairs.len() < 2 {
            return Err(ScoutError::InsufficientData { needed: 2, got: pairs.len() });
        }

        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for &(x, y) in pairs {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (y - mean_y);
        }

        if sxx == 0.0 {
            return Err(ScoutError::InsufficientData { needed: 2, got: 1 });
        }

        let slope = sxy / sxx;
        Ok(Self { slope, intercept: mean_y - slope * mean_x })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_recovers_slope_and_intercept() {
        let pairs = vec![(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0)];
        let fit = RegressionFit::fit(&pairs).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!(fit.intercept.abs() < 1e-9);
        assert!((fit.predict(5.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_line_is_close() {
        let pairs = vec![(0.0, 1.1), (1.0, 2.9), (2.0, 5.2), (3.0, 6.8)];
        let fit = RegressionFit::fit(&pairs).unwrap();
        assert!((fit.slope - 2.0).abs() < 0.2);
        assert!((fit.intercept - 1.0).abs() < 0.3);
    }

    #[test]
    fn too_few_points_fails_explicitly() {
        let err = RegressionFit::fit(&[(1.0, 2.0)]).unwrap_err();
        assert!(matches!(err, ScoutError::InsufficientData { needed: 2, got: 1 }));
    }

    #[test]
    fn constant_x_fails_instead_of_nan() {
        let err = RegressionFit::fit(&[(1.0, 2.0), (1.0, 3.0)]).unwrap_err();
        assert!(matches!(err, ScoutError::InsufficientData { .. }));
    }

    #[test]
    fn pairing_drops_missing_rows() {
        let x = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let y = vec![Some(2.0), Some(9.0), None, Some(8.0)];
        let pairs = paired_samples(&x, &y);
        assert_eq!(pairs, vec![(1.0, 2.0), (4.0, 8.0)]);
    }
}
