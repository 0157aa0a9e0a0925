//! Mathematical utility functions for fluctuation analysis.
//!
//! Regression and guarded floating-point helpers shared by the detrender and the
//! estimator. All regressions centre their inputs before accumulating sums.

use crate::errors::{DfaError, DfaResult};

/// Numerical constants
pub mod constants {
    /// Default epsilon for approximate comparisons
    pub const DEFAULT_EPSILON: f64 = 1e-10;
    /// Smallest argument accepted by [`safe_ln`](super::float_ops::safe_ln)
    pub const MIN_LOG_VALUE: f64 = f64::MIN_POSITIVE;
    /// Centred predictor sum of squares below this is treated as singular
    pub const MATRIX_CONDITION_EPSILON: f64 = 1e-14;
}

/// Safe floating point comparison functions
pub mod float_ops {
    use super::constants::{DEFAULT_EPSILON, MIN_LOG_VALUE};

    /// Check if two floating point numbers are approximately equal with custom epsilon
    #[inline]
    pub fn approx_eq_eps(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// Check if a floating point number is approximately zero
    #[inline]
    pub fn approx_zero(x: f64) -> bool {
        x.abs() < DEFAULT_EPSILON
    }

    /// Safe division that checks for near-zero denominators and infinite/NaN inputs
    pub fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
        if approx_zero(denominator) || !numerator.is_finite() || !denominator.is_finite() {
            None
        } else {
            Some(numerator / denominator)
        }
    }

    /// Safe logarithm that checks for positive arguments and finite inputs
    pub fn safe_ln(x: f64) -> Option<f64> {
        if x >= MIN_LOG_VALUE && x.is_finite() {
            Some(x.ln())
        } else {
            None
        }
    }
}

/// Straight line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope
    pub slope: f64,
    /// Intercept at x = 0
    pub intercept: f64,
}

impl LinearFit {
    /// Value of the line at `x`.
    #[inline]
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares line fit of `y` against `x`.
///
/// Both inputs are centred on their means before the sums are accumulated, which
/// avoids catastrophic cancellation when `x` values are large relative to their
/// spread (log-scales of large windows, sample indices of long segments).
///
/// # Errors
/// - `InvalidConfiguration` if the lengths differ or fewer than two points are given
/// - `InvalidConfiguration` if `x` has (near) zero spread or any value is non-finite
///
/// # Example
/// ```rust
/// use seismic_dfa::math_utils::ols_fit;
///
/// let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
/// let fit = ols_fit(&x, &y).unwrap();
/// assert!((fit.slope - 2.0).abs() < 1e-12);
/// assert!(fit.intercept.abs() < 1e-12);
/// ```
pub fn ols_fit(x: &[f64], y: &[f64]) -> DfaResult<LinearFit> {
    if x.len() != y.len() {
        return Err(DfaError::invalid(
            "regression_points",
            y.len() as f64,
            format!("same length as predictor ({})", x.len()),
        ));
    }

    if x.len() < 2 {
        return Err(DfaError::invalid("regression_points", x.len() as f64, ">= 2"));
    }

    if !x.iter().chain(y).all(|v| v.is_finite()) {
        return Err(DfaError::invalid(
            "regression_points",
            f64::NAN,
            "all values finite",
        ));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&xi, &yi)| {
            let dx = xi - mean_x;
            (sxy + dx * (yi - mean_y), sxx + dx * dx)
        });

    if sxx < constants::MATRIX_CONDITION_EPSILON {
        return Err(DfaError::invalid(
            "regression_predictor",
            sxx / n,
            "predictor variance > 0",
        ));
    }

    let slope = sxy / sxx;
    Ok(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Arithmetic mean, NaN for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Root mean square with `n` divisor, 0 for empty input.
pub fn root_mean_square(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    (data.iter().map(|v| v * v).sum::<f64>() / data.len() as f64).sqrt()
}

/// `max - min` of the data, 0 for empty input.
pub fn amplitude(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    max - min
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_ols_fit_exact_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 - 0.5 * v).collect();
        let fit = ols_fit(&x, &y).unwrap();
        assert_approx_eq!(fit.slope, -0.5, 1e-12);
        assert_approx_eq!(fit.intercept, 3.0, 1e-12);
        assert_approx_eq!(fit.at(4.0), 1.0, 1e-12);
    }

    #[test]
    fn test_ols_fit_two_points() {
        let fit = ols_fit(&[1.0, 3.0], &[2.0, 6.0]).unwrap();
        assert_approx_eq!(fit.slope, 2.0, 1e-12);
        assert_approx_eq!(fit.intercept, 0.0, 1e-12);
    }

    #[test]
    fn test_ols_fit_large_offset_predictor() {
        // Centring keeps the fit accurate far from the origin
        let x: Vec<f64> = (0..8).map(|i| 1e8 + i as f64).collect();
        let y: Vec<f64> = (0..8).map(|i| 2.0 * i as f64).collect();
        let fit = ols_fit(&x, &y).unwrap();
        assert_approx_eq!(fit.slope, 2.0, 1e-9);
    }

    #[test]
    fn test_ols_fit_rejects_degenerate_input() {
        assert!(ols_fit(&[1.0], &[1.0]).is_err());
        assert!(ols_fit(&[1.0, 2.0], &[1.0]).is_err());
        assert!(ols_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(ols_fit(&[1.0, 2.0, 3.0], &[1.0, f64::NAN, 3.0]).is_err());
    }

    #[test]
    fn test_safe_ln_guards() {
        assert!(float_ops::safe_ln(0.0).is_none());
        assert!(float_ops::safe_ln(-1.0).is_none());
        assert!(float_ops::safe_ln(f64::INFINITY).is_none());
        assert!(float_ops::safe_ln(f64::NAN).is_none());
        assert_approx_eq!(float_ops::safe_ln(std::f64::consts::E).unwrap(), 1.0, 1e-15);
    }

    #[test]
    fn test_safe_div_guards() {
        assert!(float_ops::safe_div(1.0, 0.0).is_none());
        assert_eq!(float_ops::safe_div(6.0, 3.0), Some(2.0));
        assert!(float_ops::approx_eq_eps(0.1 + 0.2, 0.3, 1e-12));
    }

    #[test]
    fn test_summary_helpers() {
        assert!(mean(&[]).is_nan());
        assert_approx_eq!(mean(&[1.0, 2.0, 3.0]), 2.0, 1e-15);
        assert_approx_eq!(root_mean_square(&[3.0, -3.0]), 3.0, 1e-15);
        assert_eq!(amplitude(&[]), 0.0);
        assert_eq!(amplitude(&[-1.0, 4.0, 2.0]), 5.0);
    }
}
