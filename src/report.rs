//! Tab-separated export of per-window estimates.
//!
//! Each estimated window becomes one row stamped with the time at the centre of
//! its window:
//!
//! ```text
//! Time	Hurst Exponent	Fractal Dimension
//! 2021-02-01 06:30:45.000	0.612	1.388
//! ```

use crate::errors::{validate_positive_finite, DfaError, DfaResult};
use crate::results::DfaEstimate;
use chrono::{Duration, NaiveDateTime};
use std::io::Write;

/// Header row of the results table.
pub const TSV_HEADER: &str = "Time\tHurst Exponent\tFractal Dimension";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Maps window indices to wall-clock times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowTimeline {
    /// Time of the first sample of window 0
    pub start: NaiveDateTime,
    /// Length of one window in seconds
    pub window_duration_seconds: f64,
}

impl WindowTimeline {
    /// Creates a timeline, rejecting a non-positive window duration.
    pub fn new(start: NaiveDateTime, window_duration_seconds: f64) -> DfaResult<Self> {
        validate_positive_finite(window_duration_seconds, "window_duration_seconds")?;
        Ok(Self {
            start,
            window_duration_seconds,
        })
    }

    /// Time at the middle of window `index`: `start + (index + 0.5) * duration`.
    ///
    /// # Errors
    /// `InvalidConfiguration` when the centre falls outside the representable
    /// calendar range.
    pub fn centre(&self, index: usize) -> DfaResult<NaiveDateTime> {
        let offset_seconds = (index as f64 + 0.5) * self.window_duration_seconds;
        offset_by_seconds(self.start, offset_seconds).ok_or_else(|| {
            DfaError::invalid(
                "window_duration_seconds",
                self.window_duration_seconds,
                format!("window {} centre within the representable date range", index),
            )
        })
    }
}

/// `start` shifted by a fractional number of seconds at microsecond resolution,
/// `None` when the offset is not finite or the result leaves chrono's range.
pub(crate) fn offset_by_seconds(start: NaiveDateTime, seconds: f64) -> Option<NaiveDateTime> {
    let micros = (seconds * 1e6).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    start.checked_add_signed(Duration::microseconds(micros as i64))
}

/// Writes the header and one row per estimated window.
///
/// Rows are stamped with the centre of each entry's own window, so windows skipped
/// as degenerate leave a gap in time rather than shifting later rows.
pub fn write_results_tsv<W: Write>(
    mut writer: W,
    timeline: &WindowTimeline,
    estimate: &DfaEstimate,
) -> DfaResult<()> {
    let io_err = |e| DfaError::io("writing results table", e);

    writeln!(writer, "{}", TSV_HEADER).map_err(io_err)?;
    for entry in estimate.iter() {
        writeln!(
            writer,
            "{}\t{:.3}\t{:.3}",
            timeline.centre(entry.index)?.format(TIME_FORMAT),
            entry.hurst,
            entry.fractal_dimension
        )
        .map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}
