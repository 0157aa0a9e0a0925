//! SAC (Seismic Analysis Code) binary waveform reader.
//!
//! A SAC file is a fixed 632-byte header (70 `f32` words, 40 `i32` words, 24
//! eight-byte strings) followed by `NPTS` `f32` samples. Files may be written in
//! either byte order; the order is detected from the header version word
//! (`NVHDR`, 6 or 7). Only evenly sampled time series (`IFTYPE = ITIME`) are
//! accepted. Version 7 footers after the samples are ignored.

use crate::errors::{validate_positive_finite, DfaError, DfaResult};
use crate::math_utils::float_ops;
use crate::report::offset_by_seconds;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

/// Size of the binary header in bytes.
pub const HEADER_BYTES: usize = 632;

/// Value of undefined header fields.
pub const UNDEFINED: i32 = -12345;

const INT_BLOCK_OFFSET: usize = 70 * 4;

// Float header words
const DELTA: usize = 0;
const B: usize = 5;

// Integer header words
const NZYEAR: usize = 0;
const NZJDAY: usize = 1;
const NZHOUR: usize = 2;
const NZMIN: usize = 3;
const NZSEC: usize = 4;
const NZMSEC: usize = 5;
const NVHDR: usize = 6;
const NPTS: usize = 9;
const IFTYPE: usize = 15;
const LEVEN: usize = 35;

const ITIME: i32 = 1;

/// Byte order of a SAC file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian
    Little,
    /// Big-endian
    Big,
}

impl ByteOrder {
    fn read_word(self, bytes: &[u8], offset: usize) -> [u8; 4] {
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[offset..offset + 4]);
        word
    }

    fn f32_at(self, bytes: &[u8], offset: usize) -> f32 {
        let word = self.read_word(bytes, offset);
        match self {
            ByteOrder::Little => f32::from_le_bytes(word),
            ByteOrder::Big => f32::from_be_bytes(word),
        }
    }

    fn i32_at(self, bytes: &[u8], offset: usize) -> i32 {
        let word = self.read_word(bytes, offset);
        match self {
            ByteOrder::Little => i32::from_le_bytes(word),
            ByteOrder::Big => i32::from_be_bytes(word),
        }
    }
}

/// One evenly sampled waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct SacTrace {
    /// Samples per second
    pub sampling_rate: f64,
    /// Time of the first sample
    pub start_time: NaiveDateTime,
    /// Amplitudes
    pub samples: Vec<f64>,
}

impl SacTrace {
    /// Duration covered by the samples, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate
    }
}

struct Header<'a> {
    bytes: &'a [u8],
    order: ByteOrder,
}

impl Header<'_> {
    fn float(&self, word: usize) -> f32 {
        self.order.f32_at(self.bytes, word * 4)
    }

    fn int(&self, word: usize) -> i32 {
        self.order.i32_at(self.bytes, INT_BLOCK_OFFSET + word * 4)
    }

    fn reference_time(&self) -> DfaResult<NaiveDateTime> {
        let fields = [
            self.int(NZYEAR),
            self.int(NZJDAY),
            self.int(NZHOUR),
            self.int(NZMIN),
            self.int(NZSEC),
            self.int(NZMSEC),
        ];

        let [year, jday, hour, minute, second, millis] = if fields.contains(&UNDEFINED) {
            [1970, 1, 0, 0, 0, 0]
        } else {
            fields
        };
        let as_u32 = |v: i32| u32::try_from(v).ok();

        as_u32(jday)
            .and_then(|jday| NaiveDate::from_yo_opt(year, jday))
            .and_then(|date| {
                date.and_hms_milli_opt(
                    as_u32(hour)?,
                    as_u32(minute)?,
                    as_u32(second)?,
                    as_u32(millis)?,
                )
            })
            .ok_or_else(|| DfaError::InvalidSacFile {
                reason: format!(
                    "invalid reference time {}-{:03} {:02}:{:02}:{:02}.{:03}",
                    year, jday, hour, minute, second, millis
                ),
            })
    }
}

fn detect_byte_order(bytes: &[u8]) -> DfaResult<ByteOrder> {
    let offset = INT_BLOCK_OFFSET + NVHDR * 4;
    for order in [ByteOrder::Little, ByteOrder::Big] {
        if matches!(order.i32_at(bytes, offset), 6 | 7) {
            return Ok(order);
        }
    }

    Err(DfaError::InvalidSacFile {
        reason: format!(
            "header version {} is neither 6 nor 7 in either byte order",
            ByteOrder::Little.i32_at(bytes, offset)
        ),
    })
}

/// Decodes a SAC file held in memory.
///
/// # Errors
/// `InvalidSacFile` for a truncated file, unknown header version, non time-series
/// file type, unevenly sampled data, non-positive sample interval, an invalid
/// reference time, or a begin offset that leaves the supported date range.
pub fn parse_sac(bytes: &[u8]) -> DfaResult<SacTrace> {
    if bytes.len() < HEADER_BYTES {
        return Err(DfaError::InvalidSacFile {
            reason: format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_BYTES
            ),
        });
    }

    let header = Header {
        bytes,
        order: detect_byte_order(bytes)?,
    };

    let iftype = header.int(IFTYPE);
    if iftype != ITIME && iftype != UNDEFINED {
        return Err(DfaError::InvalidSacFile {
            reason: format!("file type {} is not an evenly sampled time series", iftype),
        });
    }

    if header.int(LEVEN) == 0 {
        return Err(DfaError::InvalidSacFile {
            reason: "unevenly sampled data".to_string(),
        });
    }

    let delta = f64::from(header.float(DELTA));
    let sampling_rate = float_ops::safe_div(1.0, delta)
        .filter(|rate| *rate > 0.0)
        .ok_or_else(|| DfaError::InvalidSacFile {
            reason: format!("sample interval {} is not positive", delta),
        })?;
    validate_positive_finite(sampling_rate, "sampling_rate")?;

    let npts = usize::try_from(header.int(NPTS)).map_err(|_| DfaError::InvalidSacFile {
        reason: format!("negative sample count {}", header.int(NPTS)),
    })?;

    let data_end = npts
        .checked_mul(4)
        .and_then(|len| len.checked_add(HEADER_BYTES))
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| DfaError::InvalidSacFile {
            reason: format!(
                "header declares {} samples but only {} data bytes follow",
                npts,
                bytes.len() - HEADER_BYTES
            ),
        })?;

    let begin = header.float(B);
    let begin_seconds = if begin == UNDEFINED as f32 {
        0.0
    } else {
        f64::from(begin)
    };
    let start_time = offset_by_seconds(header.reference_time()?, begin_seconds).ok_or_else(
        || DfaError::InvalidSacFile {
            reason: format!(
                "begin offset {} s puts the first sample outside the supported date range",
                begin_seconds
            ),
        },
    )?;

    let order = header.order;
    let samples = bytes[HEADER_BYTES..data_end]
        .chunks_exact(4)
        .map(|word| f64::from(order.f32_at(word, 0)))
        .collect();

    Ok(SacTrace {
        sampling_rate,
        start_time,
        samples,
    })
}

/// Reads and decodes a SAC file.
pub fn read_sac(path: impl AsRef<Path>) -> DfaResult<SacTrace> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| DfaError::io(format!("reading {}", path.display()), e))?;
    let trace = parse_sac(&bytes)?;

    log::debug!(
        "Read {} samples at {} Hz starting {} from {}",
        trace.samples.len(),
        trace.sampling_rate,
        trace.start_time,
        path.display()
    );
    Ok(trace)
}

/// Joins traces end to end.
///
/// The sampling rate and start time of the first trace describe the result; traces
/// with a different rate are still appended, with a warning.
pub fn concatenate_traces(traces: Vec<SacTrace>) -> DfaResult<SacTrace> {
    let mut traces = traces.into_iter();
    let mut joined = traces.next().ok_or_else(|| DfaError::InvalidSacFile {
        reason: "no traces to concatenate".to_string(),
    })?;

    for trace in traces {
        let tolerance = joined.sampling_rate * 1e-9;
        if !float_ops::approx_eq_eps(trace.sampling_rate, joined.sampling_rate, tolerance) {
            log::warn!(
                "Appending trace at {} Hz to trace at {} Hz; the first rate is kept",
                trace.sampling_rate,
                joined.sampling_rate
            );
        }
        joined.samples.extend(trace.samples);
    }

    Ok(joined)
}
