//! Windowed DFA of SAC waveforms.
//!
//! Reads one or more SAC files, joins their samples, estimates a Hurst exponent and
//! fractal dimension per window, and writes a tab-separated table:
//!
//!   seismic-dfa station.sac --output dfa.txt --window-duration 60

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use seismic_dfa::{
    build_profile, concatenate_traces, estimate_windowed_dfa, read_sac, segment_size_for,
    write_results_tsv, DegenerateWindowPolicy, DfaConfig, DfaError, DfaResult,
    ExponentConvention, FluctuationNormalization, MinScaleRounding, SacTrace, WindowTimeline,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Clone)]
#[command(
    name = "seismic-dfa",
    version,
    about = "Windowed Detrended Fluctuation Analysis of SAC waveforms"
)]
struct Args {
    /// SAC files, concatenated in the order given
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output table (tab-separated)
    #[arg(short, long, default_value = "dfa_results.txt")]
    output: PathBuf,

    /// Window length in seconds
    #[arg(short, long, default_value_t = 60.0)]
    window_duration: f64,

    /// Smallest sub-segment length in samples, before power-of-two rounding
    #[arg(long, default_value_t = 6)]
    min_scale: usize,

    /// How the minimum scale is rounded to a power of two
    #[arg(long, value_enum, default_value_t = RoundingArg::Ceil)]
    min_scale_rounding: RoundingArg,

    /// Divisor applied to the mean sub-segment RMS
    #[arg(long, value_enum, default_value_t = NormalizationArg::UsableLength)]
    normalization: NormalizationArg,

    /// Mapping from log-log slope to Hurst exponent
    #[arg(long, value_enum, default_value_t = ExponentArg::HalfSlope)]
    exponent: ExponentArg,

    /// What to do with windows whose fluctuation function is degenerate
    #[arg(long, value_enum, default_value_t = DegenerateArg::Skip)]
    on_degenerate: DegenerateArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoundingArg {
    /// Smallest power of two >= min-scale
    Ceil,
    /// Largest power of two <= min-scale
    Truncate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NormalizationArg {
    /// Samples used at each scale, floor(L / s) * s
    UsableLength,
    /// No division
    Unnormalized,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExponentArg {
    /// H = slope / 2
    HalfSlope,
    /// H = slope
    Slope,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DegenerateArg {
    /// Drop the window and log a warning
    Skip,
    /// Abort on the first degenerate window
    Fail,
}

impl Args {
    fn config(&self) -> DfaConfig {
        DfaConfig::default()
            .with_window_duration(self.window_duration)
            .with_min_scale(self.min_scale)
            .with_min_scale_rounding(match self.min_scale_rounding {
                RoundingArg::Ceil => MinScaleRounding::Ceil,
                RoundingArg::Truncate => MinScaleRounding::Truncate,
            })
            .with_normalization(match self.normalization {
                NormalizationArg::UsableLength => FluctuationNormalization::UsableLength,
                NormalizationArg::Unnormalized => FluctuationNormalization::Unnormalized,
            })
            .with_exponent_convention(match self.exponent {
                ExponentArg::HalfSlope => ExponentConvention::HalfSlope,
                ExponentArg::Slope => ExponentConvention::Slope,
            })
            .with_degenerate_policy(match self.on_degenerate {
                DegenerateArg::Skip => DegenerateWindowPolicy::SkipAndReport,
                DegenerateArg::Fail => DegenerateWindowPolicy::Fail,
            })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn run(args: &Args) -> DfaResult<()> {
    let config = args.config();
    config.validate()?;
    config.validate_window_duration()?;

    let traces = args
        .inputs
        .iter()
        .map(read_sac)
        .collect::<DfaResult<Vec<SacTrace>>>()?;
    let trace = concatenate_traces(traces)?;
    tracing::info!(
        samples = trace.samples.len(),
        sampling_rate = trace.sampling_rate,
        start = %trace.start_time,
        "loaded waveform"
    );

    let segment_size = segment_size_for(trace.sampling_rate, config.window_duration_seconds)?;
    let profile = build_profile(&trace.samples);
    let estimate = estimate_windowed_dfa(&profile, segment_size, &config)?;

    if !estimate.is_complete() {
        tracing::warn!(
            skipped = estimate.skipped.len(),
            windows = estimate.window_count,
            "some windows were degenerate and have no estimate"
        );
    }
    if let Some(mean) = estimate.mean_hurst() {
        tracing::info!(windows = estimate.len(), mean_hurst = mean, "estimation finished");
    }

    let timeline = WindowTimeline::new(trace.start_time, config.window_duration_seconds)?;
    let file = File::create(&args.output).map_err(|e| {
        DfaError::io(format!("creating {}", args.output.display()), e)
    })?;
    write_results_tsv(BufWriter::new(file), &timeline, &estimate)?;

    println!("Results saved to {}", args.output.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("seismic_dfa=info")),
        )
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
