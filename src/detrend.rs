//! Linear detrending of short segments.
//!
//! The line is fitted against the sample index `0..N-1` with the centred closed
//! form: the index mean is `(N-1)/2` and the centred index sum of squares is
//! `N(N²-1)/12`, which is strictly positive for `N >= 2`. The fit therefore never
//! divides by zero and a near-constant segment yields a slope close to zero rather
//! than NaN.

use crate::math_utils::{root_mean_square, LinearFit};

/// Least-squares line through `segment` against its sample index.
///
/// Segments shorter than two samples are fitted by the horizontal line through their
/// only value (or zero when empty).
pub fn linear_trend(segment: &[f64]) -> LinearFit {
    let n = segment.len();
    match n {
        0 => {
            return LinearFit {
                slope: 0.0,
                intercept: 0.0,
            }
        }
        1 => {
            return LinearFit {
                slope: 0.0,
                intercept: segment[0],
            }
        }
        _ => {}
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = segment.iter().sum::<f64>() / nf;

    let sxy: f64 = segment
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64 - x_mean) * (y - y_mean))
        .sum();
    let sxx = nf * (nf * nf - 1.0) / 12.0;

    let slope = sxy / sxx;
    LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    }
}

/// Residuals of `segment` after removing its least-squares line.
///
/// The output has the same length as the input. Segments of zero or one sample are
/// fitted exactly, so their residuals are all zero.
///
/// # Example
/// ```rust
/// use seismic_dfa::detrend::detrend_linear;
///
/// let residuals = detrend_linear(&[1.0, 3.0, 5.0, 7.0]);
/// assert!(residuals.iter().all(|r| r.abs() < 1e-12));
/// ```
pub fn detrend_linear(segment: &[f64]) -> Vec<f64> {
    let fit = linear_trend(segment);
    segment
        .iter()
        .enumerate()
        .map(|(i, &y)| y - fit.at(i as f64))
        .collect()
}

/// Root-mean-square of the detrended segment (`n` divisor).
pub fn detrended_rms(segment: &[f64]) -> f64 {
    root_mean_square(&detrend_linear(segment))
}
