//! Windowed Detrended Fluctuation Analysis (DFA)
//!
//! The profile is cut into complete, non-overlapping windows of `segment_size`
//! samples (a trailing partial window is dropped). Every window is analysed on its
//! own:
//!
//! 1. For each scale `s` of the power-of-two [`ScaleSet`], the first
//!    `floor(L / s) * s` samples are split into sub-segments of length `s`.
//! 2. Each sub-segment is linearly detrended and its residual RMS computed.
//! 3. The mean RMS divided by the configured normalization divisor is the
//!    fluctuation value at `s`.
//! 4. The slope of `ln F(s)` against `ln s` becomes the Hurst exponent via the
//!    configured [`ExponentConvention`](crate::config::ExponentConvention); the
//!    fractal dimension is `2 - H`.
//!
//! ## Implementation Notes
//!
//! - Every logarithm is guarded. A fluctuation that is zero, negative, non-finite or
//!   below `degenerate_rms_tolerance * (max - min)` of the window marks the window
//!   as degenerate instead of feeding NaN or -inf into the regression.
//! - Windows share nothing but the borrowed profile; with the `parallel` feature they
//!   are analysed on the rayon pool and merged by index, which gives the same output
//!   bits as the sequential path.
//! - All logarithms are natural logarithms. Exponents are not clamped.

use crate::{
    config::{prev_power_of_two, DegenerateWindowPolicy, DfaConfig, FluctuationNormalizer},
    detrend::detrended_rms,
    errors::{validate_segment_size, DegenerateWindow, DfaError, DfaResult},
    math_utils::{amplitude, float_ops, ols_fit},
    results::{DfaEstimate, SkippedWindow},
};

// ============================================================================
// SCALE SET
// ============================================================================

/// Power-of-two sub-segment lengths used for one window length.
///
/// Strictly increasing, every entry at most the window length, at least two
/// entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleSet {
    window_length: usize,
    scales: Vec<usize>,
}

impl ScaleSet {
    /// Builds the scale set for windows of `window_length` samples.
    ///
    /// The progression starts at the rounded minimum scale and ends at the largest
    /// power of two not exceeding the window length.
    ///
    /// # Errors
    /// `InvalidConfiguration` if the configuration is invalid, the window is shorter
    /// than the minimum scale, or fewer than two scales fit in the window.
    ///
    /// # Example
    /// ```rust
    /// use seismic_dfa::{DfaConfig, ScaleSet};
    ///
    /// let scales = ScaleSet::for_window(60, &DfaConfig::default()).unwrap();
    /// assert_eq!(scales.scales(), &[8, 16, 32]);
    /// ```
    pub fn for_window(window_length: usize, config: &DfaConfig) -> DfaResult<Self> {
        config.validate()?;
        validate_segment_size(window_length, config.min_scale_samples)?;

        let first = config
            .min_scale_rounding
            .first_scale(config.min_scale_samples)
            .ok_or_else(|| {
                DfaError::invalid(
                    "min_scale_samples",
                    config.min_scale_samples as f64,
                    "a power of two representable as usize after rounding",
                )
            })?;
        let last = prev_power_of_two(window_length);

        let mut scales = Vec::new();
        let mut scale = first;
        while scale <= last {
            scales.push(scale);
            match scale.checked_mul(2) {
                Some(next) => scale = next,
                None => break,
            }
        }

        if scales.len() < 2 {
            return Err(DfaError::invalid(
                "segment_size",
                window_length as f64,
                format!(
                    ">= {} so that at least two scales starting at {} fit in a window",
                    first.saturating_mul(2),
                    first
                ),
            ));
        }

        Ok(Self {
            window_length,
            scales,
        })
    }

    /// Window length the set was built for.
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// Scales in ascending order.
    pub fn scales(&self) -> &[usize] {
        &self.scales
    }

    /// Number of scales.
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// Natural logarithms of the scales.
    pub fn log_scales(&self) -> Vec<f64> {
        self.scales.iter().map(|&s| (s as f64).ln()).collect()
    }
}

// ============================================================================
// SINGLE WINDOW
// ============================================================================

/// Full outcome of one window's analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAnalysis {
    /// Hurst exponent
    pub hurst: f64,
    /// Fractal dimension, `2 - hurst`
    pub fractal_dimension: f64,
    /// Slope of the log-log fit
    pub slope: f64,
    /// Intercept of the log-log fit
    pub intercept: f64,
    /// Fluctuation value per scale, parallel to the scale set
    pub fluctuations: Vec<f64>,
}

/// Mean detrended RMS over the sub-segments of `window` at `scale`, before
/// normalization, together with the sub-segment count.
fn mean_segment_rms(window: &[f64], scale: usize) -> (f64, usize) {
    let sub_segments = window.len() / scale;
    if sub_segments == 0 {
        return (f64::NAN, 0);
    }

    let usable = &window[..sub_segments * scale];
    let total: f64 = usable.chunks_exact(scale).map(detrended_rms).sum();
    (total / sub_segments as f64, sub_segments)
}

/// Mean detrended RMS and normalized fluctuation at every scale, in scale order.
fn fluctuation_curve(
    window: &[f64],
    scales: &ScaleSet,
    normalization: &dyn FluctuationNormalizer,
) -> Vec<(f64, f64)> {
    scales
        .scales()
        .iter()
        .map(|&scale| {
            let (mean_rms, sub_segments) = mean_segment_rms(window, scale);
            let divisor = normalization.divisor(scale, window.len(), sub_segments);
            (mean_rms, mean_rms / divisor)
        })
        .collect()
}

/// Fluctuation value of `window` at every scale of `scales`.
///
/// Values are returned as computed; zero or non-finite entries are left for the
/// caller to judge.
pub fn fluctuation_function(
    window: &[f64],
    scales: &ScaleSet,
    normalization: &dyn FluctuationNormalizer,
) -> Vec<f64> {
    fluctuation_curve(window, scales, normalization)
        .into_iter()
        .map(|(_, fluctuation)| fluctuation)
        .collect()
}

/// Analyses one window.
///
/// `scales` must be built for `window.len()`. The function is pure and may be
/// mapped over windows concurrently.
///
/// # Errors
/// Returns the [`DegenerateWindow`] reason when the window contains non-finite
/// samples, a fluctuation value is not positive, the residuals at some scale fall
/// below the degeneracy floor, or the fit fails.
pub fn analyze_window(
    window: &[f64],
    scales: &ScaleSet,
    config: &DfaConfig,
) -> Result<WindowAnalysis, DegenerateWindow> {
    if let Some(offset) = window.iter().position(|v| !v.is_finite()) {
        return Err(DegenerateWindow::NonFiniteSample { offset });
    }

    let curve = fluctuation_curve(window, scales, &config.fluctuation_normalization);
    let floor = config.degenerate_rms_tolerance * amplitude(window);

    let mut log_f = Vec::with_capacity(curve.len());
    for (&scale, &(mean_rms, value)) in scales.scales().iter().zip(&curve) {
        // NaN fails both comparisons
        if !(value > 0.0 && value.is_finite()) {
            return Err(DegenerateWindow::NonPositiveFluctuation { scale, value });
        }
        if !(mean_rms > floor) {
            return Err(DegenerateWindow::BelowTolerance {
                scale,
                mean_rms,
                floor,
            });
        }
        log_f.push(
            float_ops::safe_ln(value)
                .ok_or(DegenerateWindow::NonPositiveFluctuation { scale, value })?,
        );
    }
    let fluctuations: Vec<f64> = curve.into_iter().map(|(_, value)| value).collect();

    let fit = ols_fit(&scales.log_scales(), &log_f)
        .map_err(|_| DegenerateWindow::NonFiniteSlope)?;
    if !fit.slope.is_finite() {
        return Err(DegenerateWindow::NonFiniteSlope);
    }

    let hurst = config.exponent_convention.exponent(fit.slope);
    Ok(WindowAnalysis {
        hurst,
        fractal_dimension: 2.0 - hurst,
        slope: fit.slope,
        intercept: fit.intercept,
        fluctuations,
    })
}

// ============================================================================
// WINDOWED ESTIMATE
// ============================================================================

/// Analyses every complete window of `profile` in window order.
fn analyze_windows(
    profile: &[f64],
    segment_size: usize,
    scales: &ScaleSet,
    config: &DfaConfig,
) -> Vec<Result<WindowAnalysis, DegenerateWindow>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        profile
            .par_chunks(segment_size)
            .map(|window| analyze_window(window, scales, config))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        profile
            .chunks(segment_size)
            .map(|window| analyze_window(window, scales, config))
            .collect()
    }
}

/// Estimates the Hurst exponent and fractal dimension of every complete window of
/// `segment_size` samples in `profile`.
///
/// Trailing samples that do not fill a window are ignored. A profile shorter than
/// one window yields an empty estimate.
///
/// # Errors
/// - `InvalidConfiguration` for a zero or too small `segment_size`, an empty
///   profile, or an invalid configuration. Nothing is computed in that case.
/// - `NumericalError` for the earliest degenerate window when the policy is
///   [`DegenerateWindowPolicy::Fail`].
///
/// # Example
/// ```rust
/// use seismic_dfa::{estimate_windowed_dfa, DfaConfig};
///
/// // Deterministic, non-linear profile
/// let profile: Vec<f64> = (0..300)
///     .map(|i| ((i as f64) * 0.37).sin() * 3.0 + ((i as f64) * 0.071).cos() * 11.0)
///     .collect();
///
/// let estimate = estimate_windowed_dfa(&profile, 128, &DfaConfig::default()).unwrap();
/// assert_eq!(estimate.window_count, 2);
/// assert_eq!(estimate.len() + estimate.skipped.len(), 2);
/// ```
pub fn estimate_windowed_dfa(
    profile: &[f64],
    segment_size: usize,
    config: &DfaConfig,
) -> DfaResult<DfaEstimate> {
    validate_segment_size(segment_size, config.min_scale_samples)?;
    if profile.is_empty() {
        return Err(DfaError::invalid("profile_length", 0.0, "non-empty profile"));
    }

    let scales = ScaleSet::for_window(segment_size, config)?;
    let window_count = profile.len() / segment_size;
    let mut estimate = DfaEstimate::with_capacity(segment_size, window_count);

    if window_count == 0 {
        log::debug!(
            "Profile of {} samples is shorter than one window of {}",
            profile.len(),
            segment_size
        );
        return Ok(estimate);
    }

    let used = &profile[..window_count * segment_size];
    let outcomes = analyze_windows(used, segment_size, &scales, config);

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(analysis) => estimate.push(index, analysis.hurst, analysis.fractal_dimension),
            Err(reason) => match config.on_degenerate_window {
                DegenerateWindowPolicy::Fail => {
                    return Err(DfaError::NumericalError {
                        window: index,
                        reason,
                    })
                }
                DegenerateWindowPolicy::SkipAndReport => {
                    log::warn!("Skipping window {}: {}", index, reason);
                    estimate.skipped.push(SkippedWindow { index, reason });
                }
            },
        }
    }

    log::debug!(
        "DFA over {} windows of {} samples ({} scales {:?}): \
         {} estimated, {} skipped, {} tail samples dropped",
        window_count,
        segment_size,
        scales.len(),
        scales.scales(),
        estimate.len(),
        estimate.skipped.len(),
        profile.len() - used.len()
    );

    Ok(estimate)
}

/// Plain `(hurst, fractal_dimension)` sequences for `profile`.
///
/// Uses the default configuration with the [`DegenerateWindowPolicy::Fail`] policy,
/// so on success both sequences have exactly `profile.len() / segment_size`
/// entries.
pub fn dfa_exponent(profile: &[f64], segment_size: usize) -> DfaResult<(Vec<f64>, Vec<f64>)> {
    let config = DfaConfig::default().with_degenerate_policy(DegenerateWindowPolicy::Fail);
    estimate_windowed_dfa(profile, segment_size, &config).map(DfaEstimate::into_sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExponentConvention, FluctuationNormalization, MinScaleRounding};
    use assert_approx_eq::assert_approx_eq;

    /// Deterministic rough profile (no RNG)
    fn rough_profile(n: usize) -> Vec<f64> {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut level = 0.0;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                level += (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
                level
            })
            .collect()
    }

    #[test]
    fn test_scale_set_ceil_and_truncate() {
        let ceil = ScaleSet::for_window(60, &DfaConfig::default()).unwrap();
        assert_eq!(ceil.scales(), &[8, 16, 32]);
        assert_eq!(ceil.window_length(), 60);

        let truncate = ScaleSet::for_window(
            60,
            &DfaConfig::default().with_min_scale_rounding(MinScaleRounding::Truncate),
        )
        .unwrap();
        assert_eq!(truncate.scales(), &[4, 8, 16, 32]);
    }

    #[test]
    fn test_scale_set_includes_power_of_two_window() {
        let scales = ScaleSet::for_window(256, &DfaConfig::default()).unwrap();
        assert_eq!(scales.scales(), &[8, 16, 32, 64, 128, 256]);
        assert!(scales.scales().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_scale_set_needs_two_scales() {
        assert!(ScaleSet::for_window(15, &DfaConfig::default()).is_err());
        assert_eq!(
            ScaleSet::for_window(16, &DfaConfig::default()).unwrap().scales(),
            &[8, 16]
        );

        let truncate = DfaConfig::default().with_min_scale_rounding(MinScaleRounding::Truncate);
        assert!(ScaleSet::for_window(7, &truncate).is_err());
        assert_eq!(ScaleSet::for_window(8, &truncate).unwrap().scales(), &[4, 8]);
    }

    #[test]
    fn test_scale_set_rejects_window_below_min_scale() {
        match ScaleSet::for_window(5, &DfaConfig::default()) {
            Err(DfaError::InvalidConfiguration { parameter, .. }) => {
                assert_eq!(parameter, "segment_size")
            }
            other => panic!("Expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_fluctuation_usable_length_normalization() {
        let window = rough_profile(60);
        let scales = ScaleSet::for_window(60, &DfaConfig::default()).unwrap();

        let raw = fluctuation_function(&window, &scales, &FluctuationNormalization::Unnormalized);
        let normalized =
            fluctuation_function(&window, &scales, &FluctuationNormalization::UsableLength);

        // usable lengths for 8, 16, 32 in a 60-sample window: 56, 48, 32
        assert_approx_eq!(normalized[0], raw[0] / 56.0, 1e-15);
        assert_approx_eq!(normalized[1], raw[1] / 48.0, 1e-15);
        assert_approx_eq!(normalized[2], raw[2] / 32.0, 1e-15);
    }

    #[test]
    fn test_fluctuation_matches_manual_sub_segments() {
        let window = rough_profile(32);
        let scales = ScaleSet::for_window(32, &DfaConfig::default()).unwrap();
        let raw = fluctuation_function(&window, &scales, &FluctuationNormalization::Unnormalized);

        let manual_8: f64 = window.chunks(8).map(detrended_rms).sum::<f64>() / 4.0;
        assert_approx_eq!(raw[0], manual_8, 1e-12);
        assert_approx_eq!(raw[2], detrended_rms(&window), 1e-12);
    }

    #[test]
    fn test_analyze_window_exponent_conventions() {
        let window = rough_profile(512);
        let scales = ScaleSet::for_window(512, &DfaConfig::default()).unwrap();

        let half = analyze_window(&window, &scales, &DfaConfig::default()).unwrap();
        let full = analyze_window(
            &window,
            &scales,
            &DfaConfig::default().with_exponent_convention(ExponentConvention::Slope),
        )
        .unwrap();

        assert_approx_eq!(half.hurst, half.slope / 2.0, 1e-15);
        assert_approx_eq!(full.hurst, full.slope, 1e-15);
        assert_approx_eq!(half.slope, full.slope, 1e-15);
        assert_approx_eq!(half.fractal_dimension, 2.0 - half.hurst, 1e-15);
        assert_eq!(half.fluctuations.len(), scales.len());
    }

    #[test]
    fn test_power_law_fluctuation_recovers_slope() {
        // With usable length constant (power-of-two window), the slope equals the
        // log-log slope of the raw mean RMS
        let window = rough_profile(1024);
        let config = DfaConfig::default().with_exponent_convention(ExponentConvention::Slope);
        let scales = ScaleSet::for_window(1024, &config).unwrap();

        let normalized = analyze_window(&window, &scales, &config).unwrap();
        let raw = analyze_window(
            &window,
            &scales,
            &config
                .clone()
                .with_normalization(FluctuationNormalization::Unnormalized),
        )
        .unwrap();
        assert_approx_eq!(normalized.slope, raw.slope, 1e-12);
    }

    #[test]
    fn test_analyze_window_constant_is_degenerate() {
        let scales = ScaleSet::for_window(64, &DfaConfig::default()).unwrap();
        match analyze_window(&[3.0; 64], &scales, &DfaConfig::default()) {
            Err(DegenerateWindow::NonPositiveFluctuation { scale, value }) => {
                assert_eq!(scale, 8);
                assert_eq!(value, 0.0);
            }
            other => panic!("Expected degenerate window, got {:?}", other),
        }
    }

    #[test]
    fn test_residuals_below_floor_are_reported_as_such() {
        // Steep line plus a tiny alternating ripple: residuals are positive but far
        // below tolerance * amplitude
        let window: Vec<f64> = (0..64)
            .map(|i| 1000.0 * i as f64 + if i % 2 == 0 { 1e-9 } else { -1e-9 })
            .collect();
        let config = DfaConfig::default();
        let scales = ScaleSet::for_window(64, &config).unwrap();

        match analyze_window(&window, &scales, &config) {
            Err(DegenerateWindow::BelowTolerance {
                scale,
                mean_rms,
                floor,
            }) => {
                assert_eq!(scale, 8);
                assert!(mean_rms > 0.0);
                assert!(mean_rms <= floor);
            }
            other => panic!("Expected BelowTolerance, got {:?}", other),
        }

        // Without a floor the same window is analysable
        let no_floor = DfaConfig {
            degenerate_rms_tolerance: 0.0,
            ..DfaConfig::default()
        };
        assert!(analyze_window(&window, &scales, &no_floor).is_ok());
    }

    #[test]
    fn test_analysis_reports_the_fluctuation_function() {
        let window = rough_profile(256);
        for config in [DfaConfig::default(), DfaConfig::standard()] {
            let scales = ScaleSet::for_window(256, &config).unwrap();
            let analysis = analyze_window(&window, &scales, &config).unwrap();
            assert_eq!(
                analysis.fluctuations,
                fluctuation_function(&window, &scales, &config.fluctuation_normalization)
            );
        }
    }

    #[test]
    fn test_analyze_window_non_finite_sample() {
        let mut window = rough_profile(64);
        window[17] = f64::NAN;
        let scales = ScaleSet::for_window(64, &DfaConfig::default()).unwrap();
        assert_eq!(
            analyze_window(&window, &scales, &DfaConfig::default()),
            Err(DegenerateWindow::NonFiniteSample { offset: 17 })
        );
    }

    #[test]
    fn test_estimate_drops_tail_and_orders_windows() {
        let profile = rough_profile(3 * 128 + 50);
        let estimate = estimate_windowed_dfa(&profile, 128, &DfaConfig::default()).unwrap();

        assert_eq!(estimate.window_count, 3);
        assert_eq!(estimate.len(), 3);
        assert_eq!(estimate.window_indices, vec![0, 1, 2]);

        let scales = ScaleSet::for_window(128, &DfaConfig::default()).unwrap();
        let second =
            analyze_window(&profile[128..256], &scales, &DfaConfig::default()).unwrap();
        assert_eq!(estimate.hurst[1], second.hurst);
    }

    #[test]
    fn test_estimate_short_profile_is_empty() {
        let estimate =
            estimate_windowed_dfa(&rough_profile(100), 128, &DfaConfig::default()).unwrap();
        assert!(estimate.is_empty());
        assert_eq!(estimate.window_count, 0);
    }

    #[test]
    fn test_estimate_rejects_empty_profile() {
        assert!(matches!(
            estimate_windowed_dfa(&[], 60, &DfaConfig::default()),
            Err(DfaError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_skip_policy_reports_middle_window() {
        let mut profile = rough_profile(3 * 64);
        for v in &mut profile[64..128] {
            *v = 1.0;
        }

        let estimate = estimate_windowed_dfa(&profile, 64, &DfaConfig::default()).unwrap();
        assert_eq!(estimate.window_indices, vec![0, 2]);
        assert_eq!(estimate.skipped.len(), 1);
        assert_eq!(estimate.skipped[0].index, 1);

        let strict = DfaConfig::default().with_degenerate_policy(DegenerateWindowPolicy::Fail);
        match estimate_windowed_dfa(&profile, 64, &strict) {
            Err(DfaError::NumericalError { window, .. }) => assert_eq!(window, 1),
            other => panic!("Expected NumericalError, got {:?}", other),
        }
    }

    #[test]
    fn test_dfa_exponent_lengths() {
        let (hurst, dims) = dfa_exponent(&rough_profile(5 * 64 + 63), 64).unwrap();
        assert_eq!(hurst.len(), 5);
        assert_eq!(dims.len(), 5);
        for (h, d) in hurst.iter().zip(&dims) {
            assert_approx_eq!(h + d, 2.0, 1e-12);
        }
    }
}
