//! # Estimate Result Structures
//!
//! Per-window exponents and the run-level container returned by the windowed
//! estimator. Result sequences are parallel arrays ordered by window; each entry
//! carries the index of the window it came from so that skipped windows leave gaps
//! instead of shifting later entries.

use crate::errors::DegenerateWindow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Exponent pair for one window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowEstimate {
    /// Window index (0 = earliest window)
    pub index: usize,
    /// Hurst exponent
    pub hurst: f64,
    /// Fractal dimension, `2 - hurst`
    pub fractal_dimension: f64,
}

/// A window that was dropped under the skip-and-report policy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkippedWindow {
    /// Window index
    pub index: usize,
    /// Why the window could not be estimated
    pub reason: DegenerateWindow,
}

/// Result of a windowed DFA run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DfaEstimate {
    /// Window length in samples
    pub segment_size: usize,
    /// Number of complete windows in the profile, estimated or skipped
    pub window_count: usize,
    /// Hurst exponents of the estimated windows, in window order
    pub hurst: Vec<f64>,
    /// Fractal dimensions, parallel to `hurst`
    pub fractal_dimension: Vec<f64>,
    /// Window index of each entry in `hurst`
    pub window_indices: Vec<usize>,
    /// Windows dropped as degenerate, in window order
    pub skipped: Vec<SkippedWindow>,
}

impl DfaEstimate {
    pub(crate) fn with_capacity(segment_size: usize, window_count: usize) -> Self {
        Self {
            segment_size,
            window_count,
            hurst: Vec::with_capacity(window_count),
            fractal_dimension: Vec::with_capacity(window_count),
            window_indices: Vec::with_capacity(window_count),
            skipped: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, index: usize, hurst: f64, fractal_dimension: f64) {
        self.window_indices.push(index);
        self.hurst.push(hurst);
        self.fractal_dimension.push(fractal_dimension);
    }

    /// Number of estimated windows.
    pub fn len(&self) -> usize {
        self.hurst.len()
    }

    /// True if no window produced an estimate.
    pub fn is_empty(&self) -> bool {
        self.hurst.is_empty()
    }

    /// True if every complete window produced an estimate.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Estimated windows as structured entries.
    pub fn iter(&self) -> impl Iterator<Item = WindowEstimate> + '_ {
        self.window_indices
            .iter()
            .zip(self.hurst.iter().zip(&self.fractal_dimension))
            .map(|(&index, (&hurst, &fractal_dimension))| WindowEstimate {
                index,
                hurst,
                fractal_dimension,
            })
    }

    /// Mean Hurst exponent over estimated windows, `None` when empty.
    pub fn mean_hurst(&self) -> Option<f64> {
        if self.hurst.is_empty() {
            None
        } else {
            Some(self.hurst.iter().sum::<f64>() / self.hurst.len() as f64)
        }
    }

    /// Splits into the `(hurst, fractal_dimension)` sequences.
    pub fn into_sequences(self) -> (Vec<f64>, Vec<f64>) {
        (self.hurst, self.fractal_dimension)
    }
}
