//! Statistical validation against processes with a known Hurst exponent
//!
//! Signals are seeded so every run sees the same samples. Windows are powers of two,
//! where the usable-length normalization is the same at every scale and therefore
//! leaves the slope untouched.

use seismic_dfa::{
    build_profile, estimate_windowed_dfa, generate_fractional_gaussian_noise,
    generate_random_walk, DfaConfig, DfaEstimate, ExponentConvention, FbmConfig,
    FluctuationNormalization, GeneratorConfig,
};

const WINDOWS: usize = 16;
const WINDOW_LENGTH: usize = 512;

fn fgn_profile(hurst_exponent: f64, seed: u64) -> Vec<f64> {
    let signal = generate_fractional_gaussian_noise(
        &GeneratorConfig {
            length: WINDOWS * WINDOW_LENGTH,
            seed: Some(seed),
        },
        &FbmConfig {
            hurst_exponent,
            volatility: 1.0,
        },
    )
    .unwrap();
    build_profile(&signal)
}

fn mean_hurst(estimate: &DfaEstimate) -> f64 {
    assert_eq!(estimate.len(), WINDOWS, "every window should be estimated");
    estimate.mean_hurst().unwrap()
}

/// Test scenario: fGn signal, slope convention
///
/// The DFA slope of an fGn profile recovers H.
#[test]
fn test_fgn_slope_convention_recovers_hurst() {
    for (hurst, seed) in [(0.5, 2024), (0.75, 2025)] {
        let profile = fgn_profile(hurst, seed);
        let config = DfaConfig::default().with_exponent_convention(ExponentConvention::Slope);

        let estimate = estimate_windowed_dfa(&profile, WINDOW_LENGTH, &config).unwrap();
        let mean = mean_hurst(&estimate);

        println!("H = {}: mean slope-convention exponent {:.4}", hurst, mean);
        assert!(
            (mean - hurst).abs() < 0.1,
            "H = {}: mean exponent {:.4} not within 0.1",
            hurst,
            mean
        );
    }
}

/// Test scenario: fGn signal, default half-slope convention
///
/// The default reports half the slope, so the mean sits near H / 2.
#[test]
fn test_fgn_default_convention_reports_half_slope() {
    for (hurst, seed) in [(0.5, 2024), (0.75, 2025)] {
        let profile = fgn_profile(hurst, seed);

        let estimate =
            estimate_windowed_dfa(&profile, WINDOW_LENGTH, &DfaConfig::default()).unwrap();
        let mean = mean_hurst(&estimate);

        assert!(
            (mean - hurst / 2.0).abs() < 0.1,
            "H = {}: mean exponent {:.4} not within 0.1 of H/2",
            hurst,
            mean
        );
    }
}

#[test]
fn test_normalization_does_not_tilt_power_of_two_windows() {
    let profile = fgn_profile(0.75, 7);
    let base = DfaConfig::default().with_exponent_convention(ExponentConvention::Slope);

    let usable = estimate_windowed_dfa(&profile, WINDOW_LENGTH, &base).unwrap();
    let plain = estimate_windowed_dfa(
        &profile,
        WINDOW_LENGTH,
        &base.with_normalization(FluctuationNormalization::Unnormalized),
    )
    .unwrap();

    for (a, b) in usable.hurst.iter().zip(&plain.hurst) {
        assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
    }
}

#[test]
fn test_persistent_noise_scores_above_white_noise() {
    let config = DfaConfig::standard();
    let white = estimate_windowed_dfa(&fgn_profile(0.5, 11), WINDOW_LENGTH, &config).unwrap();
    let persistent = estimate_windowed_dfa(&fgn_profile(0.85, 11), WINDOW_LENGTH, &config).unwrap();

    assert!(persistent.mean_hurst().unwrap() > white.mean_hurst().unwrap() + 0.15);
}

/// Test scenario: random-walk profile
///
/// Observed fractal dimensions stay inside [1, 2]; the estimator does not clamp.
#[test]
fn test_random_walk_fractal_dimension_range() {
    let profile = generate_random_walk(&GeneratorConfig {
        length: 20 * 600,
        seed: Some(99),
    });

    let estimate = estimate_windowed_dfa(&profile, 600, &DfaConfig::default()).unwrap();
    assert_eq!(estimate.len(), 20);
    for &d in &estimate.fractal_dimension {
        assert!((1.0..=2.0).contains(&d), "fractal dimension {} outside [1, 2]", d);
    }
}
