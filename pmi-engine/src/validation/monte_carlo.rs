//! Monte Carlo PMI simulation
//!
//! Samples temperature, ADD requirement, base temperature and specimen length
//! from normal distributions and recomputes PMI per draw. Draws that produce
//! no usable PMI are skipped. The RNG is supplied by the caller so a fixed
//! seed reproduces the whole run.

use crate::config::{MonteCarloConfig, UncertaintyConfig};
use crate::estimator::{LARGE_LENGTH_RATIO, SMALL_LENGTH_RATIO};
use crate::stats::{self, Interval};
use pmi_common::{DevelopmentThreshold, Error, Result, TemperatureReading};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Floor for a sampled ADD requirement
const MIN_SAMPLED_ADD: f64 = 0.1;
/// Floor for a sampled specimen length (mm)
const MIN_SAMPLED_LENGTH_MM: f64 = 0.1;
/// Effective temperature used when the sampled temperature is at or below base
const MIN_SAMPLED_EFFECTIVE_TEMP_C: f64 = 0.5;

/// How the simulation loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceStatus {
    /// Window means stabilized before the iteration limit
    Converged,
    /// Iteration limit reached without stabilizing
    Exhausted,
    /// Aborted because too many draws were unusable
    TooManySkipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub mean_pmi: f64,
    /// Population standard deviation of the distribution
    pub std_pmi: f64,
    /// Confidence level (percent) → empirical percentile interval
    pub confidence_intervals: BTreeMap<u32, Interval>,
    pub distribution: Vec<f64>,
    pub convergence_achieved: bool,
    pub convergence: ConvergenceStatus,
    /// Accepted samples
    pub iterations_used: usize,
    /// Draws attempted, including skipped ones
    pub iterations_attempted: usize,
    pub samples_skipped: usize,
}

impl MonteCarloResult {
    pub fn interval(&self, level: u32) -> Option<Interval> {
        self.confidence_intervals.get(&level).copied()
    }
}

/// One draw of the uncertain parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledParameters {
    pub avg_temp_c: f64,
    pub add: f64,
    pub base_temp_c: f64,
    pub length_mm: Option<f64>,
}

/// PMI for one set of sampled parameters
///
/// Uses the coarse length adjustment (×0.7 small, ×1.3 large) rather than the
/// interpolated window positions of the deterministic estimators.
pub fn sample_pmi(params: &SampledParameters, typical_length_mm: Option<f64>) -> Result<f64> {
    let effective_temp = if params.avg_temp_c > params.base_temp_c {
        (params.avg_temp_c - params.base_temp_c).max(MIN_SAMPLED_EFFECTIVE_TEMP_C)
    } else {
        MIN_SAMPLED_EFFECTIVE_TEMP_C
    };

    let mut add = params.add;
    if let (Some(length), Some(typical)) = (params.length_mm, typical_length_mm) {
        let ratio = length / typical;
        if ratio < SMALL_LENGTH_RATIO {
            add *= 0.7;
        } else if ratio > LARGE_LENGTH_RATIO {
            add *= 1.3;
        }
    }

    let pmi = add / effective_temp;
    if !pmi.is_finite() || pmi <= 0.0 {
        return Err(Error::Sampling(format!(
            "Sample produced unusable PMI {} (T={}, base={}, add={})",
            pmi, params.avg_temp_c, params.base_temp_c, params.add
        )));
    }
    Ok(pmi)
}

fn normal(mean: f64, std_dev: f64, what: &str) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev).map_err(|e| {
        Error::Sampling(format!(
            "Invalid {} distribution (mean={}, std={}): {}",
            what, mean, std_dev, e
        ))
    })
}

/// Monte Carlo simulator
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
    uncertainties: UncertaintyConfig,
}

impl MonteCarloSimulator {
    pub fn new(config: MonteCarloConfig, uncertainties: UncertaintyConfig) -> Self {
        Self {
            config,
            uncertainties,
        }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// RNG seeded from the configured seed, or from entropy when unset
    pub fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Run up to `iterations` draws and summarize the accepted samples
    pub fn run<R: Rng + ?Sized>(
        &self,
        threshold: &DevelopmentThreshold,
        temperature: &TemperatureReading,
        length_mm: Option<f64>,
        iterations: usize,
        confidence_levels: &[u32],
        rng: &mut R,
    ) -> Result<MonteCarloResult> {
        temperature.ensure_finite()?;
        if iterations == 0 {
            return Err(Error::InvalidInput(
                "Monte Carlo iterations must be positive".to_string(),
            ));
        }
        if let Some(level) = confidence_levels.iter().find(|l| **l == 0 || **l >= 100) {
            return Err(Error::InvalidInput(format!(
                "Confidence level must be within 1..99, got {}",
                level
            )));
        }

        let mid_add = threshold.mid_add();
        let temp_dist = normal(
            temperature.avg_temp_c,
            self.uncertainties.temperature_measurement_c,
            "temperature",
        )?;
        let add_dist = normal(mid_add, mid_add * self.uncertainties.development_threshold, "ADD")?;
        let base_dist = normal(
            threshold.base_temp_c,
            threshold.base_temp_c * self.uncertainties.base_temperature,
            "base temperature",
        )?;
        let length_dist = match length_mm {
            Some(length) => Some(normal(
                length,
                length * self.uncertainties.specimen_length,
                "specimen length",
            )?),
            None => None,
        };

        let window = self.config.convergence_window.max(1);
        let max_skipped = self.config.max_skip_fraction * iterations as f64;

        let mut samples: Vec<f64> = Vec::with_capacity(iterations);
        let mut skipped = 0usize;
        let mut attempted = 0usize;
        let mut status = ConvergenceStatus::Exhausted;

        for i in 0..iterations {
            attempted += 1;

            // Draw order is fixed so a seed reproduces the run
            let params = SampledParameters {
                avg_temp_c: temp_dist.sample(rng),
                add: add_dist.sample(rng).max(MIN_SAMPLED_ADD),
                base_temp_c: base_dist.sample(rng).max(0.0),
                length_mm: length_dist
                    .as_ref()
                    .map(|d| d.sample(rng).max(MIN_SAMPLED_LENGTH_MM)),
            };

            match sample_pmi(&params, threshold.typical_length_mm) {
                Ok(pmi) => samples.push(pmi),
                Err(e) => {
                    skipped += 1;
                    debug!("Skipping Monte Carlo sample {}: {}", i, e);
                    if skipped as f64 > max_skipped {
                        warn!(
                            "Monte Carlo aborted: {} of {} samples skipped",
                            skipped, attempted
                        );
                        status = ConvergenceStatus::TooManySkipped;
                        break;
                    }
                    continue;
                }
            }

            if i > 0
                && i % window == 0
                && samples.len() >= self.config.min_convergence_samples.max(2 * window)
                && has_converged(&samples, window, self.config.convergence_threshold)
            {
                status = ConvergenceStatus::Converged;
                break;
            }
        }

        if samples.is_empty() {
            return Err(Error::Sampling(format!(
                "No usable Monte Carlo samples after {} attempts",
                attempted
            )));
        }

        let mean_pmi = stats::mean(&samples);
        let std_pmi = stats::population_std(&samples);

        let mut bounds = Vec::with_capacity(confidence_levels.len() * 2);
        for level in confidence_levels {
            let alpha = (100.0 - *level as f64) / 2.0;
            bounds.push(alpha);
            bounds.push(100.0 - alpha);
        }
        let values = stats::percentiles(&samples, &bounds);
        let confidence_intervals = confidence_levels
            .iter()
            .zip(values.chunks(2))
            .map(|(level, pair)| (*level, Interval::new(pair[0], pair[1])))
            .collect();

        info!(
            "Monte Carlo: mean={:.3}d std={:.3} samples={} skipped={} status={:?}",
            mean_pmi,
            std_pmi,
            samples.len(),
            skipped,
            status
        );

        Ok(MonteCarloResult {
            mean_pmi,
            std_pmi,
            confidence_intervals,
            iterations_used: samples.len(),
            iterations_attempted: attempted,
            samples_skipped: skipped,
            distribution: samples,
            convergence_achieved: status == ConvergenceStatus::Converged,
            convergence: status,
        })
    }
}

/// Relative change between the last two window means is below `threshold`
fn has_converged(samples: &[f64], window: usize, threshold: f64) -> bool {
    if samples.len() < 2 * window {
        return false;
    }
    let n = samples.len();
    let recent = stats::mean(&samples[n - window..]);
    let previous = stats::mean(&samples[n - 2 * window..n - window]);
    if previous == 0.0 {
        return false;
    }
    ((recent - previous) / previous).abs() < threshold
}
