//! Signal preparation for windowed DFA.
//!
//! Converts a raw amplitude series into the integrated profile the estimator
//! consumes, and turns a window duration into a window length in samples.

use crate::errors::{validate_positive_finite, DfaError, DfaResult};
use crate::math_utils::mean;

/// Cumulative sum of the mean-centred signal.
///
/// The output has the same length as the input; an empty signal gives an empty
/// profile.
///
/// # Example
/// ```rust
/// use seismic_dfa::preprocessing::build_profile;
///
/// let profile = build_profile(&[1.0, 3.0, 2.0]);
/// assert_eq!(profile, vec![-1.0, 0.0, 0.0]);
/// ```
pub fn build_profile(signal: &[f64]) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }

    let signal_mean = mean(signal);
    signal
        .iter()
        .scan(0.0, |acc, &x| {
            *acc += x - signal_mean;
            Some(*acc)
        })
        .collect()
}

/// Window length in samples for a sampling rate (Hz) and window duration (s).
///
/// The product is truncated toward zero, so 100 Hz and 60 s give 6000 samples and
/// 19.99 Hz and 1 s give 19.
///
/// # Errors
/// `InvalidConfiguration` if either input is not finite and positive, or the
/// window would hold no samples.
pub fn segment_size_for(sampling_rate: f64, window_duration_seconds: f64) -> DfaResult<usize> {
    validate_positive_finite(sampling_rate, "sampling_rate")?;
    validate_positive_finite(window_duration_seconds, "window_duration_seconds")?;

    let samples = (sampling_rate * window_duration_seconds).trunc();
    if samples < 1.0 || samples > usize::MAX as f64 {
        return Err(DfaError::invalid(
            "segment_size",
            samples,
            "sampling_rate * window_duration_seconds in [1, usize::MAX]",
        ));
    }

    Ok(samples as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_profile_ends_at_zero() {
        let signal = [0.5, -2.0, 4.25, 1.0, 3.5, -0.75];
        let profile = build_profile(&signal);
        assert_eq!(profile.len(), signal.len());
        assert_approx_eq!(*profile.last().unwrap(), 0.0, 1e-12);
    }

    #[test]
    fn test_profile_of_constant_is_flat() {
        assert!(build_profile(&[2.0; 10]).iter().all(|&v| v == 0.0));
        assert!(build_profile(&[]).is_empty());
    }

    #[test]
    fn test_segment_size_truncates() {
        assert_eq!(segment_size_for(100.0, 60.0).unwrap(), 6000);
        assert_eq!(segment_size_for(19.99, 1.0).unwrap(), 19);
        assert_eq!(segment_size_for(0.5, 60.0).unwrap(), 30);
    }

    #[test]
    fn test_segment_size_rejects_bad_inputs() {
        assert!(segment_size_for(0.0, 60.0).is_err());
        assert!(segment_size_for(100.0, -1.0).is_err());
        assert!(segment_size_for(f64::NAN, 60.0).is_err());
        assert!(segment_size_for(0.1, 5.0).is_err());
    }
}
