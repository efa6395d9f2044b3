//! Engine configuration
//!
//! Loaded from the `config.toml` resolved by [`pmi_common::config`]. Every
//! field has a compiled default so a partial (or absent) file is valid.
//! Configuration is immutable once an engine has been constructed from it.

use pmi_common::config::{load_toml, resolve_config_path, LoggingConfig, CONFIG_ENV_VAR};
use pmi_common::{Error, Result, Species};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Single-method estimator parameters
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Alternative method parameters
    #[serde(default)]
    pub methods: MethodsConfig,

    /// Thermal summation offsets
    #[serde(default)]
    pub thermal: ThermalConfig,

    /// Default uncertainty values
    #[serde(default)]
    pub uncertainty: UncertaintyConfig,

    /// Monte Carlo simulation parameters
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,

    /// Multi-specimen conflict thresholds
    #[serde(default)]
    pub specimens: SpecimenConfig,
}

impl EngineConfig {
    /// Resolve and load the configuration file (CLI path > `PMI_CONFIG` > platform default)
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR);
        let config: EngineConfig = load_toml(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the estimators cannot work with
    pub fn validate(&self) -> Result<()> {
        check_fraction("estimator.confidence_fraction", self.estimator.confidence_fraction)?;

        for (name, params) in self.methods.named_params() {
            check_fraction(&format!("methods.{}.confidence_fraction", name), params.confidence_fraction)?;
            if !(0.0..=1.0).contains(&params.reliability_weight) {
                return Err(Error::Config(format!(
                    "methods.{}.reliability_weight must be within 0..1, got {}",
                    name, params.reliability_weight
                )));
            }
        }
        if self.methods.development_rate_reference_offset_c <= 0.0 {
            return Err(Error::Config(
                "methods.development_rate_reference_offset_c must be positive".to_string(),
            ));
        }
        if self.methods.isomegalen_default_length_mm <= 0.0 {
            return Err(Error::Config(
                "methods.isomegalen_default_length_mm must be positive".to_string(),
            ));
        }

        self.thermal.default_offsets().check("thermal")?;
        for (species, offsets) in &self.thermal.species_overrides {
            species.parse::<Species>().map_err(|_| {
                Error::Config(format!("thermal.species_overrides: unknown species {}", species))
            })?;
            offsets.check(&format!("thermal.species_overrides.{}", species))?;
        }

        if self.monte_carlo.iterations == 0 || self.monte_carlo.report_iterations == 0 {
            return Err(Error::Config("monte_carlo iterations must be positive".to_string()));
        }
        if self.monte_carlo.convergence_window == 0 {
            return Err(Error::Config(
                "monte_carlo.convergence_window must be positive".to_string(),
            ));
        }
        if let Some(level) = self
            .monte_carlo
            .confidence_levels
            .iter()
            .find(|level| **level == 0 || **level >= 100)
        {
            return Err(Error::Config(format!(
                "monte_carlo.confidence_levels must be within 1..99, got {}",
                level
            )));
        }
        check_fraction("monte_carlo.max_skip_fraction", self.monte_carlo.max_skip_fraction)?;

        Ok(())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!("{} must be within 0..1, got {}", name, value)))
    }
}

/// Single-method estimator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Half-width of the confidence band as a fraction of the estimate (default: 0.2)
    #[serde(default = "default_estimator_confidence")]
    pub confidence_fraction: f64,

    /// Effective temperature used when the average is at or below base (default: 0.5°C)
    #[serde(default = "default_min_effective_temp")]
    pub min_effective_temp_c: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            confidence_fraction: default_estimator_confidence(),
            min_effective_temp_c: default_min_effective_temp(),
        }
    }
}

/// Confidence width and reliability weight of one method
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodParams {
    /// Half-width of the confidence band as a fraction of the estimate
    pub confidence_fraction: f64,
    /// Reliability weight in 0..1; reported as a 0–100 score
    pub reliability_weight: f64,
}

impl MethodParams {
    const fn new(confidence_fraction: f64, reliability_weight: f64) -> Self {
        Self {
            confidence_fraction,
            reliability_weight,
        }
    }
}

/// Alternative method parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodsConfig {
    #[serde(default = "default_add_standard")]
    pub add_standard: MethodParams,

    #[serde(default = "default_add_optimistic")]
    pub add_optimistic: MethodParams,

    #[serde(default = "default_add_conservative")]
    pub add_conservative: MethodParams,

    #[serde(default = "default_adh_method")]
    pub adh_method: MethodParams,

    #[serde(default = "default_isomegalen_method")]
    pub isomegalen_method: MethodParams,

    #[serde(default = "default_thermal_summation")]
    pub thermal_summation: MethodParams,

    #[serde(default = "default_development_rate")]
    pub development_rate: MethodParams,

    /// Temperature scaling for the optimistic bound (default: 1.15)
    #[serde(default = "default_optimistic_factor")]
    pub optimistic_temp_factor: f64,

    /// Temperature scaling for the conservative bound (default: 0.85)
    #[serde(default = "default_conservative_factor")]
    pub conservative_temp_factor: f64,

    /// Reference point above base for the development-rate constant (default: 20°C)
    #[serde(default = "default_rate_reference_offset")]
    pub development_rate_reference_offset_c: f64,

    /// Typical length assumed when the stage has none (default: 15mm)
    #[serde(default = "default_isomegalen_length")]
    pub isomegalen_default_length_mm: f64,
}

impl Default for MethodsConfig {
    fn default() -> Self {
        Self {
            add_standard: default_add_standard(),
            add_optimistic: default_add_optimistic(),
            add_conservative: default_add_conservative(),
            adh_method: default_adh_method(),
            isomegalen_method: default_isomegalen_method(),
            thermal_summation: default_thermal_summation(),
            development_rate: default_development_rate(),
            optimistic_temp_factor: default_optimistic_factor(),
            conservative_temp_factor: default_conservative_factor(),
            development_rate_reference_offset_c: default_rate_reference_offset(),
            isomegalen_default_length_mm: default_isomegalen_length(),
        }
    }
}

impl MethodsConfig {
    fn named_params(&self) -> [(&'static str, MethodParams); 7] {
        [
            ("add_standard", self.add_standard),
            ("add_optimistic", self.add_optimistic),
            ("add_conservative", self.add_conservative),
            ("adh_method", self.adh_method),
            ("isomegalen_method", self.isomegalen_method),
            ("thermal_summation", self.thermal_summation),
            ("development_rate", self.development_rate),
        ]
    }
}

/// Optimal and stress temperatures, as offsets above the base temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalOffsets {
    pub optimal_offset_c: f64,
    pub max_offset_c: f64,
}

impl ThermalOffsets {
    fn check(&self, name: &str) -> Result<()> {
        if self.optimal_offset_c <= 0.0 || self.max_offset_c <= self.optimal_offset_c {
            return Err(Error::Config(format!(
                "{}: require 0 < optimal_offset_c < max_offset_c, got {} / {}",
                name, self.optimal_offset_c, self.max_offset_c
            )));
        }
        Ok(())
    }
}

/// Thermal summation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalConfig {
    /// Optimal development temperature above base (default: 15°C)
    #[serde(default = "default_optimal_offset")]
    pub optimal_offset_c: f64,

    /// Temperature above base where stress is maximal (default: 25°C)
    #[serde(default = "default_max_offset")]
    pub max_offset_c: f64,

    /// Per-species overrides keyed by species identifier (e.g. `lucilia_sericata`)
    #[serde(default)]
    pub species_overrides: BTreeMap<String, ThermalOffsets>,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            optimal_offset_c: default_optimal_offset(),
            max_offset_c: default_max_offset(),
            species_overrides: BTreeMap::new(),
        }
    }
}

impl ThermalConfig {
    pub fn default_offsets(&self) -> ThermalOffsets {
        ThermalOffsets {
            optimal_offset_c: self.optimal_offset_c,
            max_offset_c: self.max_offset_c,
        }
    }

    /// Offsets for a species, falling back to the defaults
    pub fn offsets_for(&self, species: Species) -> ThermalOffsets {
        self.species_overrides
            .get(species.as_str())
            .copied()
            .unwrap_or_else(|| self.default_offsets())
    }
}

/// Default uncertainty values
///
/// Absolute for temperature measurement (°C); relative (fraction) otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyConfig {
    /// Temperature measurement standard deviation (default: 1.0°C)
    #[serde(default = "default_temp_measurement")]
    pub temperature_measurement_c: f64,

    #[serde(default = "default_temp_variation")]
    pub temperature_variation: f64,

    #[serde(default = "default_species_identification")]
    pub species_identification: f64,

    #[serde(default = "default_stage_identification")]
    pub stage_identification: f64,

    #[serde(default = "default_development_threshold")]
    pub development_threshold: f64,

    #[serde(default = "default_specimen_length")]
    pub specimen_length: f64,

    #[serde(default = "default_model_limitations")]
    pub model_limitations: f64,

    /// Relative spread of the sampled base temperature (default: 0.10)
    #[serde(default = "default_base_temperature")]
    pub base_temperature: f64,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            temperature_measurement_c: default_temp_measurement(),
            temperature_variation: default_temp_variation(),
            species_identification: default_species_identification(),
            stage_identification: default_stage_identification(),
            development_threshold: default_development_threshold(),
            specimen_length: default_specimen_length(),
            model_limitations: default_model_limitations(),
            base_temperature: default_base_temperature(),
        }
    }
}

/// Monte Carlo simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Maximum iterations for a standalone simulation (default: 10000)
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Iterations used inside the comprehensive report (default: 5000)
    #[serde(default = "default_report_iterations")]
    pub report_iterations: usize,

    /// Confidence levels in percent (default: 90, 95, 99)
    #[serde(default = "default_confidence_levels")]
    pub confidence_levels: Vec<u32>,

    /// Iterations between convergence checks and window size (default: 1000)
    #[serde(default = "default_convergence_window")]
    pub convergence_window: usize,

    /// Relative change in window means that counts as converged (default: 0.01)
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// Samples required before convergence is tested (default: 2000)
    #[serde(default = "default_min_convergence_samples")]
    pub min_convergence_samples: usize,

    /// Abort once skipped samples exceed this fraction of iterations (default: 0.5)
    #[serde(default = "default_max_skip_fraction")]
    pub max_skip_fraction: f64,

    /// Fixed seed for reproducible runs (default: none, seeded from entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            report_iterations: default_report_iterations(),
            confidence_levels: default_confidence_levels(),
            convergence_window: default_convergence_window(),
            convergence_threshold: default_convergence_threshold(),
            min_convergence_samples: default_min_convergence_samples(),
            max_skip_fraction: default_max_skip_fraction(),
            seed: None,
        }
    }
}

/// Multi-specimen thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenConfig {
    /// PMI spread (days) above which specimens conflict (default: 0.5)
    #[serde(default = "default_pmi_conflict_threshold")]
    pub pmi_conflict_threshold_days: f64,

    /// Quality score spread above which specimens conflict (default: 30)
    #[serde(default = "default_quality_disparity_threshold")]
    pub quality_disparity_threshold: f64,

    /// Maximum stage distance within one species before it is inconsistent (default: 2)
    #[serde(default = "default_max_stage_span")]
    pub max_stage_span: usize,

    /// Specimens scoring below this are counted as low quality (default: 70)
    #[serde(default = "default_low_quality_threshold")]
    pub low_quality_threshold: f64,

    /// Sample size below which more specimens are recommended (default: 3)
    #[serde(default = "default_min_recommended_specimens")]
    pub min_recommended_specimens: usize,
}

impl Default for SpecimenConfig {
    fn default() -> Self {
        Self {
            pmi_conflict_threshold_days: default_pmi_conflict_threshold(),
            quality_disparity_threshold: default_quality_disparity_threshold(),
            max_stage_span: default_max_stage_span(),
            low_quality_threshold: default_low_quality_threshold(),
            min_recommended_specimens: default_min_recommended_specimens(),
        }
    }
}

// Default value functions
fn default_estimator_confidence() -> f64 {
    0.2
}

fn default_min_effective_temp() -> f64 {
    0.5
}

fn default_add_standard() -> MethodParams {
    MethodParams::new(0.20, 1.0)
}

fn default_add_optimistic() -> MethodParams {
    MethodParams::new(0.15, 0.7)
}

fn default_add_conservative() -> MethodParams {
    MethodParams::new(0.25, 0.7)
}

fn default_adh_method() -> MethodParams {
    MethodParams::new(0.18, 0.9)
}

fn default_isomegalen_method() -> MethodParams {
    MethodParams::new(0.22, 0.6)
}

fn default_thermal_summation() -> MethodParams {
    MethodParams::new(0.25, 0.8)
}

fn default_development_rate() -> MethodParams {
    MethodParams::new(0.20, 0.8)
}

fn default_optimistic_factor() -> f64 {
    1.15
}

fn default_conservative_factor() -> f64 {
    0.85
}

fn default_rate_reference_offset() -> f64 {
    20.0
}

fn default_isomegalen_length() -> f64 {
    15.0
}

fn default_optimal_offset() -> f64 {
    15.0
}

fn default_max_offset() -> f64 {
    25.0
}

fn default_temp_measurement() -> f64 {
    1.0
}

fn default_temp_variation() -> f64 {
    0.15
}

fn default_species_identification() -> f64 {
    0.05
}

fn default_stage_identification() -> f64 {
    0.10
}

fn default_development_threshold() -> f64 {
    0.20
}

fn default_specimen_length() -> f64 {
    0.10
}

fn default_model_limitations() -> f64 {
    0.25
}

fn default_base_temperature() -> f64 {
    0.10
}

fn default_iterations() -> usize {
    10_000
}

fn default_report_iterations() -> usize {
    5_000
}

fn default_confidence_levels() -> Vec<u32> {
    vec![90, 95, 99]
}

fn default_convergence_window() -> usize {
    1000
}

fn default_convergence_threshold() -> f64 {
    0.01
}

fn default_min_convergence_samples() -> usize {
    2000
}

fn default_max_skip_fraction() -> f64 {
    0.5
}

fn default_pmi_conflict_threshold() -> f64 {
    0.5
}

fn default_quality_disparity_threshold() -> f64 {
    30.0
}

fn default_max_stage_span() -> usize {
    2
}

fn default_low_quality_threshold() -> f64 {
    70.0
}

fn default_min_recommended_specimens() -> usize {
    3
}
