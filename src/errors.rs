//! Error types and validation functions for windowed DFA.
//!
//! Configuration problems are fatal to an estimator call and are reported before any
//! window is processed. Numerical degeneracy is reported per window, either as an
//! error or as a skipped-window record depending on
//! [`DegenerateWindowPolicy`](crate::config::DegenerateWindowPolicy). File I/O and
//! waveform decoding failures live in their own variants.

use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Error taxonomy for the estimator and the surrounding I/O layer.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum DfaError {
    /// A configuration value or input shape makes the estimate undefined.
    #[error("Invalid configuration: {parameter} = {value}, expected {constraint}")]
    InvalidConfiguration {
        /// Parameter name
        parameter: String,
        /// Offending value
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// A window produced a fluctuation curve on which the log-log fit is undefined.
    #[error("Numerical error in window {window}: {reason}")]
    NumericalError {
        /// Index of the offending window (earliest window is 0)
        window: usize,
        /// What made the window degenerate
        reason: DegenerateWindow,
    },

    /// I/O operation error.
    #[error("I/O operation failed: {operation}")]
    Io {
        /// I/O operation that failed
        operation: String,
        /// Underlying error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Waveform file could not be decoded.
    #[error("Invalid SAC file: {reason}")]
    InvalidSacFile {
        /// What was wrong with the file
        reason: String,
    },
}

/// Result type for estimator and I/O operations.
pub type DfaResult<T> = Result<T, DfaError>;

impl DfaError {
    /// Wraps an [`std::io::Error`] with a description of the operation that failed.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        DfaError::Io {
            operation: operation.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn invalid(parameter: &str, value: f64, constraint: impl Into<String>) -> Self {
        DfaError::InvalidConfiguration {
            parameter: parameter.to_string(),
            value,
            constraint: constraint.into(),
        }
    }
}

/// Why a single window could not produce an exponent.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DegenerateWindow {
    /// The window contains a NaN or infinite sample at this offset.
    #[error("non-finite sample at offset {offset}")]
    NonFiniteSample {
        /// Offset of the sample within the window
        offset: usize,
    },
    /// The fluctuation value at `scale` is zero, negative or non-finite, so its
    /// logarithm is undefined.
    #[error("fluctuation {value:e} at scale {scale} is not a positive finite number")]
    NonPositiveFluctuation {
        /// Scale (sub-segment length) at which the fluctuation collapsed
        scale: usize,
        /// The fluctuation value that was rejected
        value: f64,
    },
    /// The mean detrended RMS at `scale` is positive but at or below the degeneracy
    /// floor, `degenerate_rms_tolerance` times the window amplitude.
    #[error("mean RMS {mean_rms:e} at scale {scale} is at or below the floor {floor:e}")]
    BelowTolerance {
        /// Scale (sub-segment length) at which the residuals vanished
        scale: usize,
        /// Mean detrended RMS before normalization
        mean_rms: f64,
        /// Floor the mean RMS had to exceed
        floor: f64,
    },
    /// The log-log regression produced a non-finite slope.
    #[error("log-log slope is not finite")]
    NonFiniteSlope,
}

/// Validates the segment size against the profile and the minimum scale.
///
/// # Example
/// ```rust
/// use seismic_dfa::errors::validate_segment_size;
///
/// assert!(validate_segment_size(60, 6).is_ok());
/// assert!(validate_segment_size(5, 6).is_err());
/// assert!(validate_segment_size(0, 6).is_err());
/// ```
pub fn validate_segment_size(segment_size: usize, min_scale_samples: usize) -> DfaResult<()> {
    if segment_size == 0 {
        return Err(DfaError::invalid("segment_size", 0.0, "must be > 0"));
    }

    if segment_size < min_scale_samples {
        return Err(DfaError::invalid(
            "segment_size",
            segment_size as f64,
            format!(">= minimum scale of {} samples", min_scale_samples),
        ));
    }

    Ok(())
}

/// Validates that a parameter is finite and strictly positive.
///
/// # Example
/// ```rust
/// use seismic_dfa::errors::validate_positive_finite;
///
/// assert!(validate_positive_finite(100.0, "sampling_rate").is_ok());
/// assert!(validate_positive_finite(0.0, "sampling_rate").is_err());
/// assert!(validate_positive_finite(f64::NAN, "sampling_rate").is_err());
/// ```
pub fn validate_positive_finite(value: f64, name: &str) -> DfaResult<()> {
    if !value.is_finite() || value <= 0.0 {
        Err(DfaError::invalid(name, value, "finite and > 0"))
    } else {
        Ok(())
    }
}
