//! Synthetic signal generators with known scaling behaviour.
//!
//! Used to validate the estimator against processes whose Hurst exponent is known:
//!
//! - **White noise**: i.i.d. Gaussian samples (H = 0.5 as a signal)
//! - **Random walk**: cumulative white noise
//! - **Fractional Gaussian noise (FGN)**: exact Gaussian FGN by Hosking's method
//!   (Durbin-Levinson recursion), O(n²) time, O(n) memory
//! - **Fractional Brownian motion (FBM)**: cumulative FGN starting at 0
//!
//! Every generator draws from a ChaCha8 stream, seeded when
//! [`GeneratorConfig::seed`] is set, so seeded output is reproducible across runs
//! and platforms.

use crate::errors::{DfaError, DfaResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Common generation parameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneratorConfig {
    /// Number of samples to generate
    pub length: usize,
    /// Random seed for reproducible generation
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: 1000,
            seed: None,
        }
    }
}

/// Parameters of fractional Gaussian noise / fractional Brownian motion.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FbmConfig {
    /// Hurst exponent (0 < H < 1)
    /// - H = 0.5: Brownian motion (independent increments)
    /// - H > 0.5: Persistent increments
    /// - H < 0.5: Anti-persistent increments
    pub hurst_exponent: f64,
    /// Standard deviation of one increment
    pub volatility: f64,
}

impl Default for FbmConfig {
    fn default() -> Self {
        Self {
            hurst_exponent: 0.5,
            volatility: 1.0,
        }
    }
}

fn rng_for(config: &GeneratorConfig) -> ChaCha8Rng {
    match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn validate_fbm(fbm_config: &FbmConfig) -> DfaResult<()> {
    let h = fbm_config.hurst_exponent;
    if !(h > 0.0 && h < 1.0) {
        return Err(DfaError::invalid("hurst_exponent", h, "(0, 1)"));
    }

    let sigma = fbm_config.volatility;
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(DfaError::invalid("volatility", sigma, "finite and > 0"));
    }

    Ok(())
}

/// Autocovariance of unit-variance FGN at lag `k`:
/// `0.5 * (|k+1|^2H - 2|k|^2H + |k-1|^2H)`.
fn fgn_autocovariance(k: usize, h: f64) -> f64 {
    let two_h = 2.0 * h;
    let k = k as f64;
    0.5 * ((k + 1.0).powf(two_h) - 2.0 * k.powf(two_h) + (k - 1.0).abs().powf(two_h))
}

/// Generates i.i.d. standard Gaussian noise.
pub fn generate_white_noise(config: &GeneratorConfig) -> Vec<f64> {
    let mut rng = rng_for(config);
    (0..config.length)
        .map(|_| rng.sample::<f64, _>(StandardNormal))
        .collect()
}

/// Generates a Gaussian random walk starting at the first increment.
pub fn generate_random_walk(config: &GeneratorConfig) -> Vec<f64> {
    generate_white_noise(config)
        .into_iter()
        .scan(0.0, |level, step| {
            *level += step;
            Some(*level)
        })
        .collect()
}

/// Generates fractional Gaussian noise with Hosking's method.
///
/// Each sample is drawn from its exact conditional distribution given all previous
/// samples; the partial-correlation coefficients are updated with the
/// Durbin-Levinson recursion.
///
/// # Errors
/// `InvalidConfiguration` if `hurst_exponent` is outside (0, 1) or `volatility` is
/// not positive.
///
/// # Example
/// ```rust
/// use seismic_dfa::generators::{generate_fractional_gaussian_noise, FbmConfig, GeneratorConfig};
///
/// let config = GeneratorConfig { length: 256, seed: Some(7) };
/// let fbm = FbmConfig { hurst_exponent: 0.7, volatility: 1.0 };
/// let noise = generate_fractional_gaussian_noise(&config, &fbm).unwrap();
/// assert_eq!(noise.len(), 256);
/// ```
pub fn generate_fractional_gaussian_noise(
    config: &GeneratorConfig,
    fbm_config: &FbmConfig,
) -> DfaResult<Vec<f64>> {
    validate_fbm(fbm_config)?;

    let n = config.length;
    if n == 0 {
        return Ok(Vec::new());
    }

    let h = fbm_config.hurst_exponent;
    let mut rng = rng_for(config);
    let gamma: Vec<f64> = (0..n).map(|k| fgn_autocovariance(k, h)).collect();

    let mut noise = Vec::with_capacity(n);
    let mut phi: Vec<f64> = Vec::with_capacity(n);
    let mut previous_phi: Vec<f64> = Vec::with_capacity(n);
    let mut variance = gamma[0];

    noise.push(variance.sqrt() * rng.sample::<f64, _>(StandardNormal));

    for t in 1..n {
        // phi[j] holds phi_{t, j+1}
        let projection: f64 = previous_phi
            .iter()
            .enumerate()
            .map(|(j, p)| p * gamma[t - 1 - j])
            .sum();
        let reflection = (gamma[t] - projection) / variance;

        phi.clear();
        phi.extend(
            (0..t - 1).map(|j| previous_phi[j] - reflection * previous_phi[t - 2 - j]),
        );
        phi.push(reflection);

        variance *= 1.0 - reflection * reflection;
        if !(variance > 0.0) {
            return Err(DfaError::invalid(
                "hurst_exponent",
                h,
                "a positive-definite FGN covariance for the requested length",
            ));
        }

        let conditional_mean: f64 = phi
            .iter()
            .enumerate()
            .map(|(j, p)| p * noise[t - 1 - j])
            .sum();
        noise.push(conditional_mean + variance.sqrt() * rng.sample::<f64, _>(StandardNormal));

        std::mem::swap(&mut phi, &mut previous_phi);
    }

    let sigma = fbm_config.volatility;
    if sigma != 1.0 {
        for value in &mut noise {
            *value *= sigma;
        }
    }

    Ok(noise)
}

/// Generates fractional Brownian motion of `config.length` samples starting at 0.
pub fn generate_fractional_brownian_motion(
    config: &GeneratorConfig,
    fbm_config: &FbmConfig,
) -> DfaResult<Vec<f64>> {
    if config.length == 0 {
        validate_fbm(fbm_config)?;
        return Ok(Vec::new());
    }

    let increments = generate_fractional_gaussian_noise(
        &GeneratorConfig {
            length: config.length - 1,
            ..config.clone()
        },
        fbm_config,
    )?;

    let mut path = Vec::with_capacity(config.length);
    path.push(0.0);
    let mut level = 0.0;
    for step in increments {
        level += step;
        path.push(level);
    }
    Ok(path)
}

/// Increments of a path (one element shorter than the input).
pub fn fbm_to_fgn(fbm: &[f64]) -> Vec<f64> {
    if fbm.len() < 2 {
        return vec![];
    }

    fbm.windows(2).map(|window| window[1] - window[0]).collect()
}
