//! # Estimator Configuration
//!
//! This module contains the configuration structure for windowed DFA: how the
//! scale set starts, how fluctuation values are normalized, how the fitted slope
//! becomes an exponent, and what happens to windows whose fluctuation curve
//! collapses.

use crate::errors::{validate_positive_finite, DfaError, DfaResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default analysis window length in seconds.
pub const DEFAULT_WINDOW_DURATION_SECONDS: f64 = 60.0;

/// Default minimum scale (sub-segment length) in samples.
pub const DEFAULT_MIN_SCALE_SAMPLES: usize = 6;

/// Default relative tolerance below which a mean RMS counts as zero.
pub const DEFAULT_DEGENERATE_RMS_TOLERANCE: f64 = 1e-10;

/// How the minimum scale is rounded onto the power-of-two grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MinScaleRounding {
    /// Smallest power of two not below the minimum scale (6 -> 8)
    #[default]
    Ceil,
    /// Largest power of two not above the minimum scale (6 -> 4)
    Truncate,
}

impl MinScaleRounding {
    /// First scale of the progression for a given minimum scale, `None` when the
    /// rounded value does not fit in `usize`.
    pub fn first_scale(self, min_scale_samples: usize) -> Option<usize> {
        match self {
            MinScaleRounding::Ceil => min_scale_samples.checked_next_power_of_two(),
            MinScaleRounding::Truncate => Some(prev_power_of_two(min_scale_samples)),
        }
    }
}

/// Largest power of two `<= n`, or 0 for `n == 0`.
pub(crate) fn prev_power_of_two(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}

/// Divisor applied to the mean sub-segment RMS at one scale.
///
/// Arguments are the scale, the window length and the number of sub-segments at
/// that scale.
pub trait FluctuationNormalizer: Send + Sync {
    /// Divisor for the mean RMS; must be finite and positive.
    fn divisor(&self, scale: usize, window_length: usize, sub_segments: usize) -> f64;
}

/// Built-in fluctuation normalization strategies.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FluctuationNormalization {
    /// Divide by the number of samples actually used at this scale,
    /// `floor(L / s) * s`. Not part of textbook DFA; it tilts the curve whenever
    /// the window length is not a multiple of every scale.
    #[default]
    UsableLength,
    /// No normalization (textbook DFA).
    Unnormalized,
    /// Caller-supplied divisor: `(scale, window_length, sub_segments) -> divisor`.
    #[cfg_attr(feature = "serde", serde(skip))]
    Custom(fn(usize, usize, usize) -> f64),
}

impl FluctuationNormalizer for FluctuationNormalization {
    fn divisor(&self, scale: usize, window_length: usize, sub_segments: usize) -> f64 {
        match self {
            FluctuationNormalization::UsableLength => (sub_segments * scale) as f64,
            FluctuationNormalization::Unnormalized => 1.0,
            FluctuationNormalization::Custom(f) => f(scale, window_length, sub_segments),
        }
    }
}

/// How the log-log slope becomes the reported exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExponentConvention {
    /// exponent = slope / 2
    #[default]
    HalfSlope,
    /// exponent = slope (DFA alpha)
    Slope,
}

impl ExponentConvention {
    /// Converts a fitted slope into an exponent.
    pub fn exponent(self, slope: f64) -> f64 {
        match self {
            ExponentConvention::HalfSlope => slope / 2.0,
            ExponentConvention::Slope => slope,
        }
    }
}

/// What the estimator does with a window whose fluctuation curve is degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DegenerateWindowPolicy {
    /// Abort the whole call with [`DfaError::NumericalError`]
    Fail,
    /// Drop the window and record it in the skipped-window list
    #[default]
    SkipAndReport,
}

/// Configuration for the windowed DFA estimator.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DfaConfig {
    /// Window length in seconds, used to derive the segment size from a sampling
    /// rate and to place window centres in time
    pub window_duration_seconds: f64,
    /// Minimum scale in samples before power-of-two rounding
    pub min_scale_samples: usize,
    /// Rounding of the minimum scale onto powers of two
    pub min_scale_rounding: MinScaleRounding,
    /// Fluctuation normalization strategy
    pub fluctuation_normalization: FluctuationNormalization,
    /// Slope to exponent conversion
    pub exponent_convention: ExponentConvention,
    /// Degenerate-window policy
    pub on_degenerate_window: DegenerateWindowPolicy,
    /// Mean RMS at or below `tolerance * (max - min of the window)` is degenerate
    pub degenerate_rms_tolerance: f64,
}

impl Default for DfaConfig {
    fn default() -> Self {
        Self {
            window_duration_seconds: DEFAULT_WINDOW_DURATION_SECONDS,
            min_scale_samples: DEFAULT_MIN_SCALE_SAMPLES,
            min_scale_rounding: MinScaleRounding::Ceil,
            fluctuation_normalization: FluctuationNormalization::UsableLength,
            exponent_convention: ExponentConvention::HalfSlope,
            on_degenerate_window: DegenerateWindowPolicy::SkipAndReport,
            degenerate_rms_tolerance: DEFAULT_DEGENERATE_RMS_TOLERANCE,
        }
    }
}

impl DfaConfig {
    /// Truncated minimum scale (scales start at 4 for the default of 6) and a failing
    /// call on degenerate windows; everything else as [`Default`].
    pub fn reference() -> Self {
        Self {
            min_scale_rounding: MinScaleRounding::Truncate,
            on_degenerate_window: DegenerateWindowPolicy::Fail,
            ..Self::default()
        }
    }

    /// Textbook DFA-1: unnormalized fluctuation and exponent equal to the slope.
    pub fn standard() -> Self {
        Self {
            fluctuation_normalization: FluctuationNormalization::Unnormalized,
            exponent_convention: ExponentConvention::Slope,
            ..Self::default()
        }
    }

    /// Sets the window duration in seconds.
    pub fn with_window_duration(mut self, seconds: f64) -> Self {
        self.window_duration_seconds = seconds;
        self
    }

    /// Sets the minimum scale in samples.
    pub fn with_min_scale(mut self, samples: usize) -> Self {
        self.min_scale_samples = samples;
        self
    }

    /// Sets the minimum-scale rounding.
    pub fn with_min_scale_rounding(mut self, rounding: MinScaleRounding) -> Self {
        self.min_scale_rounding = rounding;
        self
    }

    /// Sets the fluctuation normalization.
    pub fn with_normalization(mut self, normalization: FluctuationNormalization) -> Self {
        self.fluctuation_normalization = normalization;
        self
    }

    /// Sets the exponent convention.
    pub fn with_exponent_convention(mut self, convention: ExponentConvention) -> Self {
        self.exponent_convention = convention;
        self
    }

    /// Sets the degenerate-window policy.
    pub fn with_degenerate_policy(mut self, policy: DegenerateWindowPolicy) -> Self {
        self.on_degenerate_window = policy;
        self
    }

    /// Checks the scale and tolerance settings.
    ///
    /// The window duration is only checked where it is used
    /// ([`segment_size_for`](crate::preprocessing::segment_size_for)).
    pub fn validate(&self) -> DfaResult<()> {
        if self.min_scale_samples < 3 {
            return Err(DfaError::invalid(
                "min_scale_samples",
                self.min_scale_samples as f64,
                ">= 3",
            ));
        }

        let first = self
            .min_scale_rounding
            .first_scale(self.min_scale_samples)
            .ok_or_else(|| {
                DfaError::invalid(
                    "min_scale_samples",
                    self.min_scale_samples as f64,
                    "a power of two representable as usize after rounding",
                )
            })?;
        if first < 3 {
            return Err(DfaError::invalid(
                "min_scale_samples",
                self.min_scale_samples as f64,
                format!("first scale {} after rounding must be >= 3", first),
            ));
        }

        if !self.degenerate_rms_tolerance.is_finite() || self.degenerate_rms_tolerance < 0.0 {
            return Err(DfaError::invalid(
                "degenerate_rms_tolerance",
                self.degenerate_rms_tolerance,
                "finite and >= 0",
            ));
        }

        Ok(())
    }

    /// Validates the window duration.
    pub fn validate_window_duration(&self) -> DfaResult<()> {
        validate_positive_finite(self.window_duration_seconds, "window_duration_seconds")
    }
}
