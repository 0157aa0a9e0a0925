//! # Seismic DFA
//!
//! Windowed Detrended Fluctuation Analysis of seismic waveforms.
//!
//! A waveform is integrated into a profile, cut into fixed-duration windows, and each
//! window is reduced to a Hurst exponent `H` and a fractal dimension `D = 2 - H`. The
//! resulting sequences track how the roughness of ground motion changes over time.
//!
//! ## Key Features
//!
//! - **Windowed DFA**: power-of-two scale set, per-sub-segment linear detrending,
//!   log-log regression per window
//! - **Explicit conventions**: minimum-scale rounding, fluctuation normalization and
//!   slope-to-exponent mapping are configuration, not hidden constants
//! - **Degenerate windows**: flat or linear windows fail loudly or are skipped and
//!   reported, never turned into NaN
//! - **Parallel windows**: windows are independent and, with the `parallel` feature,
//!   analysed on the rayon pool with deterministic output
//! - **SAC input and TSV output**: read waveform files, write time-stamped results
//!
//! ## Quick Start
//!
//! ```rust
//! use seismic_dfa::{
//!     build_profile, estimate_windowed_dfa, segment_size_for, DfaConfig,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Ten seconds of a synthetic 100 Hz trace
//!     let signal: Vec<f64> = (0..1000)
//!         .map(|i| ((i as f64) * 0.3).sin() + ((i as f64) * 0.017).cos() * 2.0)
//!         .collect();
//!
//!     let config = DfaConfig::default().with_window_duration(2.5);
//!     let segment_size = segment_size_for(100.0, config.window_duration_seconds)?;
//!     let profile = build_profile(&signal);
//!
//!     let estimate = estimate_windowed_dfa(&profile, segment_size, &config)?;
//!     assert_eq!(estimate.window_count, 4);
//!     for window in estimate.iter() {
//!         println!("window {}: H = {:.3}, D = {:.3}",
//!             window.index, window.hurst, window.fractal_dimension);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`detrend`]: least-squares line removal for one sub-segment
//! - [`hurst_estimators`]: scale sets, fluctuation function, per-window and windowed
//!   estimation
//! - [`preprocessing`]: profile construction and window sizing
//! - [`sac`] and [`report`]: file input and output used by the `seismic-dfa` binary
//! - [`generators`]: synthetic processes with known Hurst exponent for validation

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod math_utils;
pub mod results;

// Analysis
pub mod detrend;
pub mod hurst_estimators;
pub mod preprocessing;

// Input, output and validation data
pub mod generators;
pub mod report;
pub mod sac;

// Re-exports for convenience - main public API
pub use config::{
    DegenerateWindowPolicy, DfaConfig, ExponentConvention, FluctuationNormalization,
    FluctuationNormalizer, MinScaleRounding,
};
pub use errors::{DegenerateWindow, DfaError, DfaResult};
pub use results::{DfaEstimate, SkippedWindow, WindowEstimate};

pub use detrend::{detrend_linear, detrended_rms, linear_trend};
pub use hurst_estimators::{
    analyze_window, dfa_exponent, estimate_windowed_dfa, fluctuation_function, ScaleSet,
    WindowAnalysis,
};
pub use preprocessing::{build_profile, segment_size_for};

pub use report::{write_results_tsv, WindowTimeline};
pub use sac::{concatenate_traces, parse_sac, read_sac, SacTrace};

pub use generators::{
    fbm_to_fgn, generate_fractional_brownian_motion, generate_fractional_gaussian_noise,
    generate_random_walk, generate_white_noise, FbmConfig, GeneratorConfig,
};
